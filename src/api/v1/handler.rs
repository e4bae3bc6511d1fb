use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::logger::*;
use serde::Serialize;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, Reply, reject};

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl ApiResponse<()> {
    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Tokens travel in headers only; the body stays empty.
fn token_pair_reply(pair: TokenPair) -> warp::reply::Response {
    let reply = warp::reply::with_header(
        warp::reply(),
        AUTHORIZATION_HEADER,
        format!("Bearer {}", pair.access_token.0),
    );
    let reply = warp::reply::with_header(reply, REFRESH_TOKEN_HEADER, pair.refresh_token.0);
    warp::reply::with_status(reply, StatusCode::NO_CONTENT).into_response()
}

pub async fn refresh(
    ctx: RequestContext,
    refresh_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let Some(refresh_token) = refresh_token.filter(|t| !t.trim().is_empty()) else {
        debug!(correlation_id = %ctx, "refresh without a token header");
        return Err(reject::custom(ApiErrorCode::AuthenticationFailed));
    };

    let outcome = auth_service
        .refresh(&ctx, &refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    match outcome.into_result() {
        Ok(pair) => Ok(token_pair_reply(pair)),
        Err(rejection) => {
            match rejection {
                RefreshRejection::Revoked => {
                    warn!(correlation_id = %ctx, %rejection, "refresh refused")
                }
                _ => debug!(correlation_id = %ctx, %rejection, "refresh refused"),
            }
            Err(reject::custom(ApiErrorCode::from(rejection)))
        }
    }
}

/// Revocation finishes before the reply is built, so a failure to deliver
/// the response cannot leave tokens alive.
pub async fn logout(
    ctx: RequestContext,
    access_token: Option<String>,
    auth_service: Arc<dyn AuthService>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let identity = match access_token.as_deref() {
        Some(token) => auth_service
            .authenticate(&ctx, token)
            .await
            .map_err(ApiErrorCode::from)
            .map_err(reject::custom)?,
        None => None,
    };

    auth_service
        .revoke_on_logout(
            &ctx,
            identity.as_ref().map(|identity| identity.id),
            access_token.as_deref(),
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

use super::handler;
use super::handler::{AUTHORIZATION_HEADER, REFRESH_TOKEN_HEADER, REQUEST_ID_HEADER};
use crate::application_port::AuthService;
use crate::domain_model::RequestContext;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let refresh = warp::post()
        .and(warp::path("token"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(with_context())
        .and(warp::header::optional::<String>(REFRESH_TOKEN_HEADER))
        .and(with(auth_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_context())
        .and(with_bearer())
        .and(with(auth_service))
        .and_then(handler::logout);

    refresh.or(logout)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_context() -> impl Filter<Extract = (RequestContext,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(REQUEST_ID_HEADER)
        .map(|id: Option<String>| RequestContext::from_header(id.as_deref()))
}

/// The bearer token, if one was sent in the expected form.
fn with_bearer() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION_HEADER).map(
        |value: Option<String>| {
            value
                .as_deref()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_owned)
        },
    )
}

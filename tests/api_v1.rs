use std::sync::Arc;
use tokenguard::api;
use tokenguard::application_impl::*;
use tokenguard::application_port::*;
use tokenguard::domain_model::*;
use tokenguard::infra_memory::*;
use warp::Filter;
use warp::http::StatusCode;

const SECRET: &str = "integration-secret-that-is-comfortably-over-32-bytes";

fn auth_service() -> Arc<RealAuthService> {
    let repo = Arc::new(MemoryIdentityTokenRepo::new());
    repo.insert(IdentityRecord::new(IdentityId(42), "alice", Role::User));
    let codec = Arc::new(
        JwtHs256Codec::try_new(JwtConfig {
            issuer: "tokenguard.it".to_string(),
            access_ttl: chrono::Duration::minutes(30),
            refresh_ttl: chrono::Duration::days(14),
            signing_key: SECRET.as_bytes().to_vec(),
        })
        .unwrap(),
    );
    let crypto = Arc::new(AesGcmRefreshTokenCrypto::try_new(SECRET).unwrap());
    let blacklist = Arc::new(TokenBlacklist::new(
        Arc::new(MemoryBlacklistStore::new()),
        codec.clone(),
    ));
    let revocation = Arc::new(RealRevocationService::new(repo.clone(), blacklist.clone()));
    let rotation = Arc::new(RealRefreshRotationService::new(
        repo.clone(),
        codec.clone(),
        crypto.clone(),
        blacklist.clone(),
        revocation.clone(),
    ));
    Arc::new(RealAuthService::new(
        repo, codec, crypto, blacklist, rotation, revocation,
    ))
}

fn api(
    auth: Arc<RealAuthService>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(auth))
        .recover(api::v1::recover_error)
}

async fn login(auth: &RealAuthService) -> TokenPair {
    auth.issue_login_tokens(&RequestContext::new("login"), IdentityId(42))
        .await
        .unwrap()
}

fn header<'a>(res: &'a warp::http::Response<warp::hyper::body::Bytes>, name: &str) -> &'a str {
    res.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn refresh_returns_new_pair_in_headers() {
    let auth = auth_service();
    let pair = login(&auth).await;

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/token/refresh")
        .header("x-request-id", "req-1")
        .header(api::v1::REFRESH_TOKEN_HEADER, &pair.refresh_token.0)
        .reply(&api(auth.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.body().is_empty());
    let bearer = header(&res, "authorization");
    let access = bearer.strip_prefix("Bearer ").unwrap();
    let refresh = header(&res, api::v1::REFRESH_TOKEN_HEADER);
    assert_ne!(refresh, pair.refresh_token.0);
    assert!(auth
        .authenticate(&RequestContext::new("check"), access)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn every_refresh_failure_looks_the_same() {
    let auth = auth_service();
    let pair = login(&auth).await;
    let filter = api(auth.clone());

    // Rotate once so the original token becomes a replay.
    let first = warp::test::request()
        .method("POST")
        .path("/api/v1/token/refresh")
        .header(api::v1::REFRESH_TOKEN_HEADER, &pair.refresh_token.0)
        .reply(&filter)
        .await;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let replay = warp::test::request()
        .method("POST")
        .path("/api/v1/token/refresh")
        .header(api::v1::REFRESH_TOKEN_HEADER, &pair.refresh_token.0)
        .reply(&filter)
        .await;
    let garbage = warp::test::request()
        .method("POST")
        .path("/api/v1/token/refresh")
        .header(api::v1::REFRESH_TOKEN_HEADER, "garbage")
        .reply(&filter)
        .await;
    let missing = warp::test::request()
        .method("POST")
        .path("/api/v1/token/refresh")
        .reply(&filter)
        .await;

    for res in [&replay, &garbage, &missing] {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "AuthenticationFailed");
    }
    assert_eq!(replay.body(), garbage.body());
}

#[tokio::test]
async fn logout_revokes_bearer_token() {
    let auth = auth_service();
    let pair = login(&auth).await;

    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/logout")
        .header("authorization", format!("Bearer {}", pair.access_token.0))
        .reply(&api(auth.clone()))
        .await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(auth.is_blacklisted(&pair.access_token.0).await.unwrap());
    assert!(!auth.is_version_current(IdentityId(42), 0).await.unwrap());
}

#[tokio::test]
async fn logout_without_usable_token_is_still_no_content() {
    let auth = auth_service();
    login(&auth).await;
    let filter = api(auth.clone());

    for authorization in [None, Some("Bearer garbage"), Some("Basic abc")] {
        let mut req = warp::test::request().method("POST").path("/api/v1/logout");
        if let Some(value) = authorization {
            req = req.header("authorization", value);
        }
        let res = req.reply(&filter).await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }
    assert!(auth.is_version_current(IdentityId(42), 0).await.unwrap());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let res = warp::test::request()
        .method("GET")
        .path("/api/v1/nowhere")
        .reply(&api(auth_service()))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

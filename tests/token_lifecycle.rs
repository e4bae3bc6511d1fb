use std::sync::Arc;
use tokenguard::application_impl::*;
use tokenguard::application_port::*;
use tokenguard::domain_model::*;
use tokenguard::domain_port::*;
use tokenguard::infra_memory::*;

const SECRET: &str = "integration-secret-that-is-comfortably-over-32-bytes";

struct Harness {
    repo: Arc<MemoryIdentityTokenRepo>,
    crypto: Arc<AesGcmRefreshTokenCrypto>,
    codec: Arc<JwtHs256Codec>,
    auth: Arc<RealAuthService>,
}

fn harness() -> Harness {
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
    let auth = Arc::new(RealAuthService::new(
        repo.clone(),
        codec.clone(),
        crypto.clone(),
        blacklist,
        rotation,
        revocation,
    ));
    Harness {
        repo,
        crypto,
        codec,
        auth,
    }
}

impl Harness {
    async fn record(&self) -> IdentityRecord {
        self.repo.find_by_id(IdentityId(42)).await.unwrap().unwrap()
    }

    async fn stored_refresh(&self) -> Option<String> {
        self.record()
            .await
            .token_state
            .encrypted_refresh_token
            .map(|ct| self.crypto.decrypt(&ct).unwrap())
    }
}

fn ctx(id: &str) -> RequestContext {
    RequestContext::new(id)
}

#[test]
fn crypto_round_trips_and_never_repeats_ciphertext() {
    let crypto = AesGcmRefreshTokenCrypto::try_new(SECRET).unwrap();
    for plaintext in ["r", "eyJhbGciOiJIUzI1NiJ9.e30.sig", "ünïcödé token"] {
        let a = crypto.encrypt(plaintext).unwrap();
        let b = crypto.encrypt(plaintext).unwrap();
        assert_ne!(a, b);
        assert_eq!(crypto.decrypt(&a).unwrap(), plaintext);
        assert_eq!(crypto.decrypt(&b).unwrap(), plaintext);
    }
}

#[test]
fn crypto_with_blank_or_short_secret_fails_fast() {
    for secret in ["", "    ", "0123456789"] {
        assert!(matches!(
            AesGcmRefreshTokenCrypto::try_new(secret),
            Err(CryptoError::ConfigurationInvalid(_))
        ));
    }
}

#[tokio::test]
async fn rotation_then_replay_then_cascade() {
    let h = harness();

    let login = h.auth.issue_login_tokens(&ctx("login"), IdentityId(42)).await.unwrap();
    let r1 = login.refresh_token.0.clone();
    assert_eq!(h.stored_refresh().await.as_deref(), Some(r1.as_str()));

    // Happy path.
    let rotated = h
        .auth
        .refresh(&ctx("rotate"), &r1)
        .await
        .unwrap()
        .into_result()
        .unwrap();
    let r2 = rotated.refresh_token.0.clone();
    assert_ne!(r2, r1);
    assert_eq!(h.stored_refresh().await.as_deref(), Some(r2.as_str()));
    assert_eq!(h.record().await.token_version(), 0);

    // Replay of the rotated token is treated as theft.
    let replay = h.auth.refresh(&ctx("replay"), &r1).await.unwrap();
    assert!(matches!(
        replay,
        RefreshOutcome::Rejected(RefreshRejection::Revoked)
    ));
    let record = h.record().await;
    assert_eq!(record.token_version(), 1);
    assert!(record.token_state.encrypted_refresh_token.is_none());

    // The legitimate successor dies with the version bump.
    let cascade = h.auth.refresh(&ctx("cascade"), &r2).await.unwrap();
    assert!(matches!(
        cascade,
        RefreshOutcome::Rejected(RefreshRejection::Invalid(
            InvalidRefreshReason::VersionMismatch
        ))
    ));

    // So does every access token minted at version 0.
    assert!(h
        .auth
        .authenticate(&ctx("access"), &rotated.access_token.0)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn logout_blacklists_access_token_and_advances_version() {
    let h = harness();
    let login = h.auth.issue_login_tokens(&ctx("login"), IdentityId(42)).await.unwrap();
    let a1 = login.access_token.0.clone();
    assert!(h.auth.is_version_current(IdentityId(42), 0).await.unwrap());

    h.auth
        .revoke_on_logout(&ctx("logout"), Some(IdentityId(42)), Some(&a1))
        .await
        .unwrap();

    assert!(h.auth.is_blacklisted(&a1).await.unwrap());
    assert!(!h.auth.is_version_current(IdentityId(42), 0).await.unwrap());

    let after = h
        .auth
        .refresh(&ctx("after-logout"), &login.refresh_token.0)
        .await
        .unwrap();
    assert!(matches!(
        after,
        RefreshOutcome::Rejected(RefreshRejection::Invalid(
            InvalidRefreshReason::VersionMismatch
        ))
    ));
}

#[tokio::test]
async fn inactive_account_cannot_refresh() {
    let h = harness();
    let login = h.auth.issue_login_tokens(&ctx("login"), IdentityId(42)).await.unwrap();
    h.repo.set_active(IdentityId(42), ActiveStatus::Inactive);

    let outcome = h
        .auth
        .refresh(&ctx("inactive"), &login.refresh_token.0)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RefreshOutcome::Rejected(RefreshRejection::AccountInactive)
    ));
    assert_eq!(h.record().await.token_version(), 0);
}

#[tokio::test]
async fn expired_refresh_token_is_reported_as_expired() {
    let h = harness();
    let record = h.record().await;
    let token = h
        .codec
        .issue(&record.subject(), TokenType::Refresh, chrono::Duration::seconds(1))
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let outcome = h.auth.refresh(&ctx("expired"), &token.value).await.unwrap();
    assert!(matches!(
        outcome,
        RefreshOutcome::Rejected(RefreshRejection::Expired)
    ));
    assert_eq!(h.record().await.token_version(), 0);
}

#[tokio::test]
async fn relogin_displaces_previous_device() {
    let h = harness();
    let first = h.auth.issue_login_tokens(&ctx("device-1"), IdentityId(42)).await.unwrap();
    let second = h.auth.issue_login_tokens(&ctx("device-2"), IdentityId(42)).await.unwrap();

    assert!(h.auth.is_blacklisted(&first.refresh_token.0).await.unwrap());
    assert_eq!(
        h.stored_refresh().await.as_deref(),
        Some(second.refresh_token.0.as_str())
    );

    // The displaced token now reads as a replay.
    let outcome = h
        .auth
        .refresh(&ctx("device-1"), &first.refresh_token.0)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RefreshOutcome::Rejected(RefreshRejection::Revoked)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refresh_of_one_token_rotates_at_most_once() {
    let h = harness();
    let login = h.auth.issue_login_tokens(&ctx("login"), IdentityId(42)).await.unwrap();
    let r1 = login.refresh_token.0;

    let mut tasks = Vec::new();
    for i in 0..8 {
        let auth = h.auth.clone();
        let token = r1.clone();
        tasks.push(tokio::spawn(async move {
            auth.refresh(&RequestContext::new(format!("race-{}", i)), &token)
                .await
                .unwrap()
        }));
    }

    let mut rotated = 0;
    for task in tasks {
        if let RefreshOutcome::Rotated(_) = task.await.unwrap() {
            rotated += 1;
        }
    }
    assert_eq!(rotated, 1);

    // Every loser presented a token that was no longer current, so the
    // identity ends up revoked, possibly more than once.
    let record = h.record().await;
    assert!(record.token_version() >= 1);
    assert!(record.token_state.encrypted_refresh_token.is_none());
}

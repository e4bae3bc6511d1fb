use crate::application_impl::TokenBlacklist;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_LOGIN_ATTEMPTS: usize = 3;

pub struct RealAuthService {
    identity_repo: Arc<dyn IdentityTokenRepo>,
    token_codec: Arc<dyn TokenCodec>,
    crypto: Arc<dyn RefreshTokenCrypto>,
    blacklist: Arc<TokenBlacklist>,
    rotation: Arc<dyn RefreshRotationService>,
    revocation: Arc<dyn RevocationService>,
}

impl RealAuthService {
    pub fn new(
        identity_repo: Arc<dyn IdentityTokenRepo>,
        token_codec: Arc<dyn TokenCodec>,
        crypto: Arc<dyn RefreshTokenCrypto>,
        blacklist: Arc<TokenBlacklist>,
        rotation: Arc<dyn RefreshRotationService>,
        revocation: Arc<dyn RevocationService>,
    ) -> Self {
        Self {
            identity_repo,
            token_codec,
            crypto,
            blacklist,
            rotation,
            revocation,
        }
    }

    /// One identity keeps one refresh slot: the token a new login displaces
    /// goes on the blacklist so a later replay of it is caught.
    async fn blacklist_previous_refresh(&self, ctx: &RequestContext, previous: &TokenState) {
        let Some(stored) = previous
            .encrypted_refresh_token
            .as_deref()
            .filter(|s| !s.is_empty())
        else {
            return;
        };
        let token = match self.crypto.decrypt(stored) {
            Ok(token) if !token.is_empty() => token,
            Ok(_) => return,
            Err(e) => {
                warn!(correlation_id = %ctx, "previous refresh token unreadable, skipping blacklist: {}", e);
                return;
            }
        };
        if let Err(e) = self.blacklist.add(&token).await {
            warn!(correlation_id = %ctx, "failed to blacklist previous refresh token: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn issue_login_tokens(
        &self,
        ctx: &RequestContext,
        identity_id: IdentityId,
    ) -> Result<TokenPair, AuthError> {
        for _ in 0..MAX_LOGIN_ATTEMPTS {
            let identity = self
                .identity_repo
                .find_by_id(identity_id)
                .await?
                .ok_or(AuthError::IdentityNotFound)?;
            if !identity.is_active() {
                return Err(AuthError::AccountInactive);
            }

            let subject = identity.subject();
            let access = self.token_codec.issue_access(&subject)?;
            let refresh = self.token_codec.issue_refresh(&subject)?;
            let next = identity
                .token_state
                .with_refresh(self.crypto.encrypt(&refresh.value)?);

            if self
                .identity_repo
                .compare_and_swap(identity.id, &identity.token_state, &next)
                .await?
            {
                self.blacklist_previous_refresh(ctx, &identity.token_state)
                    .await;
                info!(
                    correlation_id = %ctx,
                    %identity_id,
                    token_version = subject.token_version,
                    jti = %refresh.claims.jti,
                    "login tokens issued"
                );
                return Ok(TokenPair::from_issued(access, refresh));
            }
            debug!(correlation_id = %ctx, %identity_id, "token state changed during login, retrying");
        }

        Err(AuthError::InternalError(format!(
            "token state of identity {} kept changing during login",
            identity_id
        )))
    }

    async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<RefreshOutcome, AuthError> {
        self.rotation.refresh(ctx, refresh_token.trim()).await
    }

    async fn revoke_on_logout(
        &self,
        ctx: &RequestContext,
        identity_id: Option<IdentityId>,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.revocation
            .revoke_on_logout(ctx, identity_id, access_token)
            .await
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError> {
        self.blacklist.contains(token.trim()).await
    }

    async fn is_version_current(
        &self,
        identity_id: IdentityId,
        token_version: u64,
    ) -> Result<bool, AuthError> {
        Ok(self
            .identity_repo
            .find_by_id(identity_id)
            .await?
            .is_some_and(|identity| identity.token_version() == token_version))
    }

    async fn authenticate(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<Option<AuthenticatedIdentity>, AuthError> {
        let token = access_token.trim();
        if token.is_empty() || self.blacklist.contains(token).await? {
            return Ok(None);
        }

        let Some(claims) = self.token_codec.parse(token).valid() else {
            return Ok(None);
        };
        if claims.token_type != TokenType::Access {
            debug!(correlation_id = %ctx, subject = %claims.subject, "non-access token presented");
            return Ok(None);
        }

        let identity = match self.identity_repo.find_by_login_id(&claims.subject).await? {
            Some(identity) if identity.is_active() => identity,
            _ => return Ok(None),
        };
        if identity.token_version() != claims.version {
            debug!(correlation_id = %ctx, subject = %claims.subject, "access token from a revoked session");
            return Ok(None);
        }

        Ok(Some(AuthenticatedIdentity {
            id: identity.id,
            login_id: identity.login_id,
            role: identity.role,
            token_version: claims.version,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::jwt_codec::tests::{TEST_SECRET, test_config};
    use crate::application_impl::{
        AesGcmRefreshTokenCrypto, JwtHs256Codec, RealRefreshRotationService,
        RealRevocationService,
    };
    use crate::infra_memory::{MemoryBlacklistStore, MemoryIdentityTokenRepo};

    struct Fixture {
        repo: Arc<MemoryIdentityTokenRepo>,
        codec: Arc<JwtHs256Codec>,
        service: RealAuthService,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MemoryIdentityTokenRepo::new());
        repo.insert(IdentityRecord::new(IdentityId(42), "alice", Role::Admin));
        let codec = Arc::new(JwtHs256Codec::try_new(test_config()).unwrap());
        let crypto = Arc::new(AesGcmRefreshTokenCrypto::try_new(TEST_SECRET).unwrap());
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
        let service = RealAuthService::new(
            repo.clone(),
            codec.clone(),
            crypto,
            blacklist,
            rotation,
            revocation,
        );
        Fixture {
            repo,
            codec,
            service,
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new("test")
    }

    #[tokio::test]
    async fn login_issues_pair_bound_to_current_version() {
        let f = fixture();
        let pair = f
            .service
            .issue_login_tokens(&ctx(), IdentityId(42))
            .await
            .unwrap();

        let access = f.codec.parse(&pair.access_token.0).valid().unwrap();
        let refresh = f.codec.parse(&pair.refresh_token.0).valid().unwrap();
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(access.version, 0);
        assert_eq!(access.role, Role::Admin);

        let authenticated = f
            .service
            .authenticate(&ctx(), &pair.access_token.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(authenticated.id, IdentityId(42));
        assert_eq!(authenticated.login_id, "alice");
    }

    #[tokio::test]
    async fn second_login_blacklists_displaced_refresh_token() {
        let f = fixture();
        let first = f
            .service
            .issue_login_tokens(&ctx(), IdentityId(42))
            .await
            .unwrap();
        f.service
            .issue_login_tokens(&ctx(), IdentityId(42))
            .await
            .unwrap();

        assert!(f
            .service
            .is_blacklisted(&first.refresh_token.0)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn login_for_unknown_or_inactive_identity_fails() {
        let f = fixture();
        assert!(matches!(
            f.service.issue_login_tokens(&ctx(), IdentityId(7)).await,
            Err(AuthError::IdentityNotFound)
        ));

        f.repo.set_active(IdentityId(42), ActiveStatus::Inactive);
        assert!(matches!(
            f.service.issue_login_tokens(&ctx(), IdentityId(42)).await,
            Err(AuthError::AccountInactive)
        ));
    }

    #[tokio::test]
    async fn refresh_token_does_not_authenticate_requests() {
        let f = fixture();
        let pair = f
            .service
            .issue_login_tokens(&ctx(), IdentityId(42))
            .await
            .unwrap();
        assert!(f
            .service
            .authenticate(&ctx(), &pair.refresh_token.0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn logout_kills_access_token_and_version() {
        let f = fixture();
        let pair = f
            .service
            .issue_login_tokens(&ctx(), IdentityId(42))
            .await
            .unwrap();

        f.service
            .revoke_on_logout(&ctx(), Some(IdentityId(42)), Some(&pair.access_token.0))
            .await
            .unwrap();

        assert!(f.service.is_blacklisted(&pair.access_token.0).await.unwrap());
        assert!(!f.service.is_version_current(IdentityId(42), 0).await.unwrap());
        assert!(f.service.is_version_current(IdentityId(42), 1).await.unwrap());
        assert!(f
            .service
            .authenticate(&ctx(), &pair.access_token.0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn inactive_account_fails_authentication() {
        let f = fixture();
        let pair = f
            .service
            .issue_login_tokens(&ctx(), IdentityId(42))
            .await
            .unwrap();
        f.repo.set_active(IdentityId(42), ActiveStatus::Inactive);
        assert!(f
            .service
            .authenticate(&ctx(), &pair.access_token.0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn login_replaces_an_empty_stored_refresh_column() {
        let f = fixture();
        let mut record = IdentityRecord::new(IdentityId(43), "bob", Role::User);
        record.token_state.encrypted_refresh_token = Some(String::new());
        f.repo.insert(record);

        let pair = f
            .service
            .issue_login_tokens(&ctx(), IdentityId(43))
            .await
            .unwrap();

        let stored = f
            .repo
            .find_by_id(IdentityId(43))
            .await
            .unwrap()
            .unwrap()
            .token_state
            .encrypted_refresh_token
            .unwrap();
        assert!(!stored.is_empty());
        assert!(f
            .service
            .authenticate(&ctx(), &pair.access_token.0)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn unknown_identity_is_never_current() {
        let f = fixture();
        assert!(!f.service.is_version_current(IdentityId(999), 0).await.unwrap());
    }
}

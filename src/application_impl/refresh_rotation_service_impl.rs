use crate::application_impl::TokenBlacklist;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A lost compare-and-swap re-runs validation against the fresh state; this
/// bounds how often that can happen within one call.
const MAX_ROTATION_ATTEMPTS: usize = 3;

pub struct RealRefreshRotationService {
    identity_repo: Arc<dyn IdentityTokenRepo>,
    token_codec: Arc<dyn TokenCodec>,
    crypto: Arc<dyn RefreshTokenCrypto>,
    blacklist: Arc<TokenBlacklist>,
    revocation: Arc<dyn RevocationService>,
}

impl RealRefreshRotationService {
    pub fn new(
        identity_repo: Arc<dyn IdentityTokenRepo>,
        token_codec: Arc<dyn TokenCodec>,
        crypto: Arc<dyn RefreshTokenCrypto>,
        blacklist: Arc<TokenBlacklist>,
        revocation: Arc<dyn RevocationService>,
    ) -> Self {
        Self {
            identity_repo,
            token_codec,
            crypto,
            blacklist,
            revocation,
        }
    }

    #[inline]
    fn rejected(rejection: RefreshRejection) -> RefreshOutcome {
        RefreshOutcome::Rejected(rejection)
    }

    fn parse_refresh_claims(&self, token: &str) -> Result<TokenClaims, RefreshRejection> {
        let claims = match self.token_codec.parse(token) {
            TokenParseOutcome::Valid(claims) => claims,
            TokenParseOutcome::Expired => return Err(RefreshRejection::Expired),
            TokenParseOutcome::Malformed => {
                return Err(RefreshRejection::Invalid(InvalidRefreshReason::Malformed));
            }
        };
        if claims.token_type != TokenType::Refresh {
            return Err(RefreshRejection::Invalid(InvalidRefreshReason::WrongType));
        }
        if claims.subject.trim().is_empty() {
            return Err(RefreshRejection::Invalid(InvalidRefreshReason::MissingSubject));
        }
        Ok(claims)
    }

    /// Steps 3 to 5 against one snapshot of the identity. A replay or a
    /// stored-value mismatch revokes the identity before returning.
    async fn validate_against(
        &self,
        ctx: &RequestContext,
        identity: &IdentityRecord,
        presented: &str,
        claims: &TokenClaims,
    ) -> Result<Option<RefreshRejection>, AuthError> {
        if claims.version != identity.token_version() {
            debug!(
                correlation_id = %ctx,
                subject = %claims.subject,
                claim_version = claims.version,
                current_version = identity.token_version(),
                "refresh token from a superseded session"
            );
            return Ok(Some(RefreshRejection::Invalid(
                InvalidRefreshReason::VersionMismatch,
            )));
        }

        if self.blacklist.contains(presented).await? {
            warn!(
                correlation_id = %ctx,
                subject = %claims.subject,
                jti = %claims.jti,
                "refresh token replay detected, revoking every token of the identity"
            );
            self.revoke_detached(ctx, identity, presented).await?;
            return Ok(Some(RefreshRejection::Revoked));
        }

        let stored = identity
            .token_state
            .encrypted_refresh_token
            .as_deref()
            .unwrap_or_default();
        let matches = match self.crypto.decrypt(stored) {
            Ok(plaintext) => {
                !plaintext.is_empty() && TokenHash::of(&plaintext) == TokenHash::of(presented)
            }
            Err(e) => {
                warn!(correlation_id = %ctx, subject = %claims.subject, "stored refresh token unreadable: {}", e);
                false
            }
        };
        if !matches {
            warn!(
                correlation_id = %ctx,
                subject = %claims.subject,
                jti = %claims.jti,
                "refresh token does not match the stored one, revoking every token of the identity"
            );
            self.revoke_detached(ctx, identity, presented).await?;
            return Ok(Some(RefreshRejection::Invalid(
                InvalidRefreshReason::StoredTokenMismatch,
            )));
        }

        Ok(None)
    }

    /// Step 6. `None` means another writer changed the token state between
    /// our read and our swap.
    async fn rotate(
        &self,
        ctx: &RequestContext,
        identity: &IdentityRecord,
        presented: &str,
        claims: &TokenClaims,
    ) -> Result<Option<TokenPair>, AuthError> {
        let subject = identity.subject();
        let access = self.token_codec.issue_access(&subject)?;
        let refresh = self.token_codec.issue_refresh(&subject)?;
        let encrypted = self.crypto.encrypt(&refresh.value)?;

        let next = identity.token_state.with_refresh(encrypted);
        if !self
            .identity_repo
            .compare_and_swap(identity.id, &identity.token_state, &next)
            .await?
        {
            return Ok(None);
        }

        // The swap already made the presented token unusable; the blacklist
        // entry is what turns a later replay into a theft signal.
        if let Err(e) = self.blacklist.add_with_claims(presented, claims).await {
            error!(
                correlation_id = %ctx,
                subject = %claims.subject,
                jti = %claims.jti,
                "failed to blacklist rotated refresh token: {}",
                e
            );
        }

        info!(
            correlation_id = %ctx,
            identity_id = %identity.id,
            old_jti = %claims.jti,
            new_jti = %refresh.claims.jti,
            "refresh token rotated"
        );
        Ok(Some(TokenPair::from_issued(access, refresh)))
    }

    /// Runs the revocation on its own task so a caller that goes away
    /// mid-request cannot cancel it part way through.
    async fn revoke_detached(
        &self,
        ctx: &RequestContext,
        identity: &IdentityRecord,
        presented: &str,
    ) -> Result<(), AuthError> {
        let mut tokens = vec![presented.to_owned()];
        if let Some(stored) = identity.token_state.encrypted_refresh_token.as_deref() {
            if let Ok(current) = self.crypto.decrypt(stored) {
                if !current.is_empty() && current != presented {
                    tokens.push(current);
                }
            }
        }

        let revocation = self.revocation.clone();
        let ctx = ctx.clone();
        let identity_id = identity.id;
        tokio::spawn(async move { revocation.revoke_identity(&ctx, identity_id, &tokens).await })
            .await
            .map_err(|e| AuthError::InternalError(format!("revocation task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl RefreshRotationService for RealRefreshRotationService {
    async fn refresh(
        &self,
        ctx: &RequestContext,
        presented_refresh_token: &str,
    ) -> Result<RefreshOutcome, AuthError> {
        let presented = presented_refresh_token.trim();

        let claims = match self.parse_refresh_claims(presented) {
            Ok(claims) => claims,
            Err(rejection) => {
                debug!(correlation_id = %ctx, %rejection, "refresh token rejected at parse");
                return Ok(Self::rejected(rejection));
            }
        };

        for attempt in 1..=MAX_ROTATION_ATTEMPTS {
            let identity = match self.identity_repo.find_by_login_id(&claims.subject).await? {
                Some(identity) if identity.is_active() => identity,
                _ => {
                    debug!(correlation_id = %ctx, subject = %claims.subject, "refresh for missing or inactive account");
                    return Ok(Self::rejected(RefreshRejection::AccountInactive));
                }
            };

            if let Some(rejection) = self
                .validate_against(ctx, &identity, presented, &claims)
                .await?
            {
                return Ok(Self::rejected(rejection));
            }

            match self.rotate(ctx, &identity, presented, &claims).await? {
                Some(pair) => return Ok(RefreshOutcome::Rotated(pair)),
                None => debug!(
                    correlation_id = %ctx,
                    subject = %claims.subject,
                    attempt,
                    "lost a concurrent rotation, re-validating"
                ),
            }
        }

        warn!(correlation_id = %ctx, subject = %claims.subject, "refresh kept losing concurrent rotations");
        Ok(Self::rejected(RefreshRejection::Invalid(
            InvalidRefreshReason::Contended,
        )))
    }
}

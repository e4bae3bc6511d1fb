use crate::application_impl::TokenBlacklist;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RealRevocationService {
    identity_repo: Arc<dyn IdentityTokenRepo>,
    blacklist: Arc<TokenBlacklist>,
}

impl RealRevocationService {
    pub fn new(identity_repo: Arc<dyn IdentityTokenRepo>, blacklist: Arc<TokenBlacklist>) -> Self {
        Self {
            identity_repo,
            blacklist,
        }
    }
}

#[async_trait::async_trait]
impl RevocationService for RealRevocationService {
    async fn revoke_on_logout(
        &self,
        ctx: &RequestContext,
        identity_id: Option<IdentityId>,
        access_token: Option<&str>,
    ) -> Result<(), AuthError> {
        let Some(identity_id) = identity_id.filter(IdentityId::is_valid) else {
            debug!(correlation_id = %ctx, "logout without a usable identity, nothing to revoke");
            return Ok(());
        };

        // The version bump goes first: it alone already kills every token.
        match self.identity_repo.revoke(identity_id).await? {
            Some(state) => info!(
                correlation_id = %ctx,
                %identity_id,
                token_version = state.token_version,
                "tokens revoked on logout"
            ),
            None => {
                debug!(correlation_id = %ctx, %identity_id, "logout for unknown identity");
                return Ok(());
            }
        }

        if let Some(token) = access_token.map(str::trim).filter(|t| !t.is_empty()) {
            self.blacklist.add(token).await?;
        }
        Ok(())
    }

    async fn revoke_identity(
        &self,
        ctx: &RequestContext,
        identity_id: IdentityId,
        tokens: &[String],
    ) -> Result<(), AuthError> {
        let state = self.identity_repo.revoke(identity_id).await?;

        let mut blacklisted = 0usize;
        for token in tokens {
            if self.blacklist.add(token).await? {
                blacklisted += 1;
            }
        }

        info!(
            correlation_id = %ctx,
            %identity_id,
            token_version = state.map(|s| s.token_version),
            blacklisted,
            "identity tokens revoked"
        );
        Ok(())
    }
}

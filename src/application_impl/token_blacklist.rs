use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Token-level view over a `BlacklistStore`: hashes values before they reach
/// storage and reads the entry expiry out of the token's own claims.
pub struct TokenBlacklist {
    store: Arc<dyn BlacklistStore>,
    codec: Arc<dyn TokenCodec>,
}

impl TokenBlacklist {
    pub fn new(store: Arc<dyn BlacklistStore>, codec: Arc<dyn TokenCodec>) -> Self {
        Self { store, codec }
    }

    pub async fn contains(&self, token: &str) -> Result<bool, AuthError> {
        if token.trim().is_empty() {
            return Ok(false);
        }
        self.store.contains(&TokenHash::of(token)).await
    }

    pub async fn add_with_claims(&self, token: &str, claims: &TokenClaims) -> Result<(), AuthError> {
        self.store.add(&BlacklistEntry::new(token, claims)).await
    }

    /// Returns `false` when there was nothing to record: blank input, or a
    /// token that no longer verifies and so can never be accepted anyway.
    pub async fn add(&self, token: &str) -> Result<bool, AuthError> {
        if token.trim().is_empty() {
            return Ok(false);
        }
        match self.codec.parse(token) {
            TokenParseOutcome::Valid(claims) => {
                self.add_with_claims(token, &claims).await?;
                Ok(true)
            }
            TokenParseOutcome::Expired | TokenParseOutcome::Malformed => Ok(false),
        }
    }
}

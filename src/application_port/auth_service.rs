use crate::application_port::{CryptoError, RefreshOutcome, TokenCodecError};
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("identity not found")]
    IdentityNotFound,
    #[error("account inactive")]
    AccountInactive,
    #[error("token codec error: {0}")]
    Codec(#[from] TokenCodecError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// The boundary the transport layer talks to.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Called once per successful primary authentication.
    async fn issue_login_tokens(
        &self,
        ctx: &RequestContext,
        identity_id: IdentityId,
    ) -> Result<TokenPair, AuthError>;

    async fn refresh(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<RefreshOutcome, AuthError>;

    async fn revoke_on_logout(
        &self,
        ctx: &RequestContext,
        identity_id: Option<IdentityId>,
        access_token: Option<&str>,
    ) -> Result<(), AuthError>;

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AuthError>;

    async fn is_version_current(
        &self,
        identity_id: IdentityId,
        token_version: u64,
    ) -> Result<bool, AuthError>;

    /// Full request-authentication check for an access token: blacklist,
    /// signature/expiry, type, account status and version.
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<Option<AuthenticatedIdentity>, AuthError>;
}

use crate::application_port::AuthError;
use crate::domain_model::*;
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InvalidRefreshReason {
    Malformed,
    WrongType,
    MissingSubject,
    VersionMismatch,
    StoredTokenMismatch,
    Contended,
}

impl fmt::Display for InvalidRefreshReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvalidRefreshReason::Malformed => "malformed",
            InvalidRefreshReason::WrongType => "wrong token type",
            InvalidRefreshReason::MissingSubject => "missing subject",
            InvalidRefreshReason::VersionMismatch => "version mismatch",
            InvalidRefreshReason::StoredTokenMismatch => "stored token mismatch",
            InvalidRefreshReason::Contended => "concurrent rotation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum RefreshRejection {
    #[error("refresh token expired")]
    Expired,
    #[error("refresh token invalid: {0}")]
    Invalid(InvalidRefreshReason),
    #[error("refresh token revoked")]
    Revoked,
    #[error("account inactive")]
    AccountInactive,
}

/// Expected outcomes of a refresh call. Infrastructure failures travel
/// separately as `AuthError`.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Rotated(TokenPair),
    Rejected(RefreshRejection),
}

impl RefreshOutcome {
    pub fn into_result(self) -> Result<TokenPair, RefreshRejection> {
        match self {
            RefreshOutcome::Rotated(pair) => Ok(pair),
            RefreshOutcome::Rejected(rejection) => Err(rejection),
        }
    }
}

#[async_trait::async_trait]
pub trait RefreshRotationService: Send + Sync {
    async fn refresh(
        &self,
        ctx: &RequestContext,
        presented_refresh_token: &str,
    ) -> Result<RefreshOutcome, AuthError>;
}

#[async_trait::async_trait]
pub trait RevocationService: Send + Sync {
    /// Logout path. Never an error for a missing or unknown identity.
    async fn revoke_on_logout(
        &self,
        ctx: &RequestContext,
        identity_id: Option<IdentityId>,
        access_token: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Incident path: blacklist the given tokens, bump the version and clear
    /// the stored refresh ciphertext.
    async fn revoke_identity(
        &self,
        ctx: &RequestContext,
        identity_id: IdentityId,
        tokens: &[String],
    ) -> Result<(), AuthError>;
}

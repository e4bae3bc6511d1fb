use crate::application_port::*;
use crate::domain_model::*;

/// Storage for the per-identity token fields. The identity row itself is
/// owned elsewhere; this port only reads it and writes its token state.
#[async_trait::async_trait]
pub trait IdentityTokenRepo: Send + Sync {
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<IdentityRecord>, AuthError>;

    async fn find_by_login_id(&self, login_id: &str)
    -> Result<Option<IdentityRecord>, AuthError>;

    /// Atomically replace the token state if, and only if, the stored state
    /// still equals `expected`. Returns `false` when another writer got there
    /// first (or the identity is gone).
    async fn compare_and_swap(
        &self,
        id: IdentityId,
        expected: &TokenState,
        next: &TokenState,
    ) -> Result<bool, AuthError>;

    /// Atomically bump the version and clear the stored refresh ciphertext.
    /// `None` when the identity does not exist.
    async fn revoke(&self, id: IdentityId) -> Result<Option<TokenState>, AuthError>;
}

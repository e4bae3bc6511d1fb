use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait BlacklistStore: Send + Sync {
    /// Idempotent: adding an entry that is already present is not an error.
    async fn add(&self, entry: &BlacklistEntry) -> Result<(), AuthError>;

    /// Entries past their own expiry count as absent.
    async fn contains(&self, token_hash: &TokenHash) -> Result<bool, AuthError>;

    /// Drop entries whose expiry is at or before `now`; returns how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryBlacklistStore {
    entries: DashMap<TokenHash, BlacklistEntry>,
}

impl MemoryBlacklistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl BlacklistStore for MemoryBlacklistStore {
    async fn add(&self, entry: &BlacklistEntry) -> Result<(), AuthError> {
        self.entries
            .entry(entry.token_hash.clone())
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn contains(&self, token_hash: &TokenHash) -> Result<bool, AuthError> {
        let now = Utc::now();
        Ok(self
            .entries
            .get(token_hash)
            .is_some_and(|entry| !entry.is_expired_at(now)))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }
}

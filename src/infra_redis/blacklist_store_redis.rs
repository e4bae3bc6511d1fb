use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Blacklist backed by Redis keys that expire together with the token they
/// name, so there is nothing to purge.
pub struct RedisBlacklistStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisBlacklistStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisBlacklistStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token_hash: &TokenHash) -> String {
        format!("{}:{}", self.prefix, token_hash)
    }

    /// Whole seconds until `until`, rounded up so the key never expires
    /// before the token does.
    fn ttl_secs(until: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
        let millis = (until - now).num_milliseconds();
        if millis <= 0 {
            return None;
        }
        Some(u64::try_from(millis).ok()?.div_ceil(1000))
    }
}

#[async_trait::async_trait]
impl BlacklistStore for RedisBlacklistStore {
    async fn add(&self, entry: &BlacklistEntry) -> Result<(), AuthError> {
        let Some(ttl_secs) = Self::ttl_secs(entry.expires_at, Utc::now()) else {
            // Already past its own expiry; the token can never verify again.
            return Ok(());
        };

        let key = self.key(&entry.token_hash);
        let mut conn = self.conn.clone();
        // NX keeps a re-add from stretching the original ttl.
        let _: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(&entry.subject)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn contains(&self, token_hash: &TokenHash) -> Result<bool, AuthError> {
        let key = self.key(token_hash);
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(exists)
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, AuthError> {
        Ok(0)
    }
}

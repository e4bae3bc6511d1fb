use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

pub struct MySqlBlacklistStore {
    pool: MySqlPool,
}

impl MySqlBlacklistStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlBlacklistStore { pool }
    }
}

#[async_trait::async_trait]
impl BlacklistStore for MySqlBlacklistStore {
    async fn add(&self, entry: &BlacklistEntry) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT IGNORE INTO blacklisted_token (token_hash, token_type, subject, expires_at)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(&entry.token_hash.0)
        .bind(entry.token_type.as_str())
        .bind(&entry.subject)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn contains(&self, token_hash: &TokenHash) -> Result<bool, AuthError> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
SELECT 1
FROM blacklisted_token
WHERE token_hash = ? AND expires_at > ?
LIMIT 1
"#,
        )
        .bind(&token_hash.0)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(found.is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let result = sqlx::query("DELETE FROM blacklisted_token WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlIdentityTokenRepo {
    pool: MySqlPool,
}

impl MySqlIdentityTokenRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlIdentityTokenRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<IdentityRecord, AuthError> {
        let id: i64 = row.try_get("id").map_err(store_err)?;
        let login_id: String = row.try_get("login_id").map_err(store_err)?;
        let role: String = row.try_get("role").map_err(store_err)?;
        let active: String = row.try_get("active").map_err(store_err)?;
        let token_version: u64 = row.try_get("token_version").map_err(store_err)?;
        let encrypted_refresh_token: Option<String> =
            row.try_get("refresh_token_encrypted").map_err(store_err)?;

        Ok(IdentityRecord {
            id: IdentityId(id),
            login_id,
            role: role.parse::<Role>().map_err(store_err)?,
            active: active.parse::<ActiveStatus>().map_err(store_err)?,
            token_state: token_state_from_columns(token_version, encrypted_refresh_token),
        })
    }
}

/// Keeps the column exactly as stored: `compare_and_swap` matches the
/// expected state with `<=>`, so an empty string must not turn into NULL.
fn token_state_from_columns(
    token_version: u64,
    encrypted_refresh_token: Option<String>,
) -> TokenState {
    TokenState {
        token_version,
        encrypted_refresh_token,
    }
}

fn store_err<E: std::fmt::Display>(e: E) -> AuthError {
    AuthError::Store(e.to_string())
}

#[async_trait::async_trait]
impl IdentityTokenRepo for MySqlIdentityTokenRepo {
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<IdentityRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, login_id, role, active, token_version, refresh_token_encrypted
FROM identity
WHERE id = ?
"#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn find_by_login_id(
        &self,
        login_id: &str,
    ) -> Result<Option<IdentityRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, login_id, role, active, token_version, refresh_token_encrypted
FROM identity
WHERE login_id = ?
"#,
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn compare_and_swap(
        &self,
        id: IdentityId,
        expected: &TokenState,
        next: &TokenState,
    ) -> Result<bool, AuthError> {
        // `<=>` is MySQL's NULL-safe equality, so an empty slot compares too.
        let result = sqlx::query(
            r#"
UPDATE identity
SET token_version = ?, refresh_token_encrypted = ?
WHERE id = ? AND token_version = ? AND refresh_token_encrypted <=> ?
"#,
        )
        .bind(next.token_version)
        .bind(next.encrypted_refresh_token.as_deref())
        .bind(id.0)
        .bind(expected.token_version)
        .bind(expected.encrypted_refresh_token.as_deref())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, id: IdentityId) -> Result<Option<TokenState>, AuthError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let updated = sqlx::query(
            r#"
UPDATE identity
SET token_version = token_version + 1, refresh_token_encrypted = NULL
WHERE id = ?
"#,
        )
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(store_err)?;
            return Ok(None);
        }

        let token_version: u64 = sqlx::query_scalar("SELECT token_version FROM identity WHERE id = ?")
            .bind(id.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        Ok(Some(TokenState {
            token_version,
            encrypted_refresh_token: None,
        }))
    }
}

use async_trait::async_trait;
use flightwatch_core::repository::{CachedToken, TokenStore};
use flightwatch_core::CoreResult;
use sqlx::SqlitePool;

use crate::storage;

/// The `amadeus_token` table holds at most one row, `id = 1`.
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    access_token: String,
    expires_at: i64,
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self) -> CoreResult<Option<CachedToken>> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT access_token, expires_at FROM amadeus_token WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        Ok(row.map(|r| CachedToken {
            access_token: r.access_token,
            expires_at: r.expires_at,
        }))
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&CachedToken>,
        new: &CachedToken,
    ) -> CoreResult<bool> {
        let result = match expected {
            None => {
                sqlx::query(
                    "INSERT INTO amadeus_token (id, access_token, expires_at) VALUES (1, ?, ?) ON CONFLICT(id) DO NOTHING",
                )
                .bind(&new.access_token)
                .bind(new.expires_at)
                .execute(&self.pool)
                .await
            }
            Some(current) => {
                sqlx::query(
                    r#"
                    UPDATE amadeus_token SET access_token = ?, expires_at = ?
                    WHERE id = 1 AND access_token = ? AND expires_at = ?
                    "#,
                )
                .bind(&new.access_token)
                .bind(new.expires_at)
                .bind(&current.access_token)
                .bind(current.expires_at)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(storage)?;

        Ok(result.rows_affected() == 1)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flightwatch_core::repository::ResultStore;
use flightwatch_core::{CandidateOffer, CoreError, CoreResult, NormalizedOffer, WatchedResult};
use sqlx::SqlitePool;

use crate::storage;

pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    id: i64,
    watch_id: i64,
    rule_name: String,
    captured_at: DateTime<Utc>,
    offer_json: String,
}

impl TryFrom<ResultRow> for WatchedResult {
    type Error = CoreError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let offer: NormalizedOffer = serde_json::from_str(&row.offer_json)
            .map_err(|e| CoreError::Storage(format!("result {}: {}", row.id, e)))?;

        Ok(WatchedResult {
            id: row.id,
            watch_id: row.watch_id,
            rule_name: row.rule_name,
            captured_at: row.captured_at,
            offer,
        })
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn insert(
        &self,
        watch_id: i64,
        candidate: &CandidateOffer,
        captured_at: DateTime<Utc>,
    ) -> CoreResult<i64> {
        let offer_json = serde_json::to_string(&candidate.offer)
            .map_err(|e| CoreError::Storage(e.to_string()))?;

        // Price and carrier are duplicated out of the JSON so history can be queried.
        let result = sqlx::query(
            r#"
            INSERT INTO watched_results (watch_id, rule_name, captured_at, carrier, total_price, currency, offer_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(watch_id)
        .bind(&candidate.rule_name)
        .bind(captured_at)
        .bind(&candidate.offer.carrier)
        .bind(candidate.offer.total_price)
        .bind(&candidate.offer.currency)
        .bind(offer_json)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_for_watch(&self, watch_id: i64) -> CoreResult<Vec<WatchedResult>> {
        sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, watch_id, rule_name, captured_at, offer_json
            FROM watched_results
            WHERE watch_id = ?
            ORDER BY captured_at DESC, id DESC
            "#,
        )
        .bind(watch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?
        .into_iter()
        .map(WatchedResult::try_from)
        .collect()
    }
}

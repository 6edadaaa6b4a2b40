use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use flightwatch_core::repository::WatchStore;
use flightwatch_core::{CoreError, CoreResult, TravelClass, Watch, WatchSpec};
use sqlx::SqlitePool;

use crate::storage;

pub struct SqliteWatchStore {
    pool: SqlitePool,
}

impl SqliteWatchStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct WatchRow {
    id: i64,
    rule_id: i64,
    rule_name: String,
    origin: String,
    destination: String,
    depart_date: NaiveDate,
    return_date: Option<NaiveDate>,
    flex_days: i64,
    adults: i64,
    travel_class: String,
    currency: String,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<WatchRow> for Watch {
    type Error = CoreError;

    fn try_from(row: WatchRow) -> Result<Self, Self::Error> {
        Ok(Watch {
            id: row.id,
            rule_id: row.rule_id,
            rule_name: row.rule_name,
            origin: row.origin,
            destination: row.destination,
            depart_date: row.depart_date,
            return_date: row.return_date,
            flex_days: row.flex_days.max(0) as u32,
            adults: row.adults.max(0) as u32,
            travel_class: row
                .travel_class
                .parse::<TravelClass>()
                .map_err(|e| CoreError::Storage(format!("watch {}: {}", row.id, e)))?,
            currency: row.currency,
            enabled: row.enabled,
            created_at: row.created_at,
        })
    }
}

fn not_found(id: i64) -> CoreError {
    CoreError::NotFound { entity: "watch", id }
}

const SELECT_WATCHES: &str = r#"
    SELECT w.id, w.rule_id, r.name AS rule_name, w.origin, w.destination, w.depart_date,
           w.return_date, w.flex_days, w.adults, w.travel_class, w.currency, w.enabled, w.created_at
    FROM watched_searches w
    JOIN flight_rules r ON r.id = w.rule_id
"#;

impl SqliteWatchStore {
    async fn fetch(&self, sql: String) -> CoreResult<Vec<Watch>> {
        sqlx::query_as::<_, WatchRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Watch::try_from)
            .collect()
    }
}

#[async_trait]
impl WatchStore for SqliteWatchStore {
    async fn insert(&self, spec: &WatchSpec) -> CoreResult<i64> {
        let rule_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM flight_rules WHERE id = ?")
            .bind(spec.rule_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        if rule_exists.is_none() {
            return Err(CoreError::NotFound { entity: "rule", id: spec.rule_id });
        }

        let s = &spec.search;
        let result = sqlx::query(
            r#"
            INSERT INTO watched_searches
                (rule_id, origin, destination, depart_date, return_date, flex_days, adults,
                 travel_class, currency, enabled, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            "#,
        )
        .bind(spec.rule_id)
        .bind(&s.origin)
        .bind(&s.destination)
        .bind(s.depart_date)
        .bind(s.return_date)
        .bind(s.flex_days as i64)
        .bind(s.adults as i64)
        .bind(s.travel_class.as_str())
        .bind(&s.currency)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_all(&self) -> CoreResult<Vec<Watch>> {
        self.fetch(format!("{} ORDER BY w.created_at DESC, w.id DESC", SELECT_WATCHES)).await
    }

    async fn list_enabled(&self) -> CoreResult<Vec<Watch>> {
        self.fetch(format!("{} WHERE w.enabled = 1 ORDER BY w.id", SELECT_WATCHES)).await
    }

    async fn get(&self, id: i64) -> CoreResult<Watch> {
        let row = sqlx::query_as::<_, WatchRow>(&format!("{} WHERE w.id = ?", SELECT_WATCHES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }

    async fn set_enabled(&self, id: i64, enabled: bool) -> CoreResult<()> {
        let result = sqlx::query("UPDATE watched_searches SET enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM watched_searches WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}

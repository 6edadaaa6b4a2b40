use async_trait::async_trait;
use flightwatch_core::repository::RuleStore;
use flightwatch_core::{CarrierAllowList, CoreError, CoreResult, NewRule, Rule, RuleUpdate};
use sqlx::SqlitePool;

use crate::storage;

pub struct SqliteRuleStore {
    pool: SqlitePool,
}

impl SqliteRuleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    id: i64,
    name: String,
    carrier_allow_list: String,
    non_stop_only: bool,
    max_allowed_stops: i64,
    enabled: bool,
}

impl From<RuleRow> for Rule {
    fn from(row: RuleRow) -> Self {
        Rule {
            id: row.id,
            name: row.name,
            carrier_allow_list: CarrierAllowList::parse(&row.carrier_allow_list),
            non_stop_only: row.non_stop_only,
            max_allowed_stops: row.max_allowed_stops.max(0) as u32,
            enabled: row.enabled,
        }
    }
}

/// Stored as a comma-separated string, empty meaning "any carrier".
fn carriers_column(list: &CarrierAllowList) -> String {
    list.to_query_value().unwrap_or_default()
}

fn not_found(id: i64) -> CoreError {
    CoreError::NotFound { entity: "rule", id }
}

const SELECT_RULES: &str =
    "SELECT id, name, carrier_allow_list, non_stop_only, max_allowed_stops, enabled FROM flight_rules";

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn list_active(&self) -> CoreResult<Vec<Rule>> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!("{} WHERE enabled = 1 ORDER BY id", SELECT_RULES))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        Ok(rows.into_iter().map(Rule::from).collect())
    }

    async fn list_all(&self) -> CoreResult<Vec<Rule>> {
        let rows = sqlx::query_as::<_, RuleRow>(&format!("{} ORDER BY id", SELECT_RULES))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        Ok(rows.into_iter().map(Rule::from).collect())
    }

    async fn get(&self, id: i64) -> CoreResult<Rule> {
        let row = sqlx::query_as::<_, RuleRow>(&format!("{} WHERE id = ?", SELECT_RULES))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(Rule::from).ok_or_else(|| not_found(id))
    }

    async fn insert(&self, rule: &NewRule) -> CoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO flight_rules (name, carrier_allow_list, non_stop_only, max_allowed_stops, enabled)
            VALUES (?, ?, ?, ?, 1)
            "#,
        )
        .bind(&rule.name)
        .bind(carriers_column(&rule.carrier_allow_list))
        .bind(rule.non_stop_only)
        .bind(rule.max_allowed_stops as i64)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(result.last_insert_rowid())
    }

    async fn update_fields(&self, id: i64, update: &RuleUpdate) -> CoreResult<Rule> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let current: Rule = sqlx::query_as::<_, RuleRow>(&format!("{} WHERE id = ?", SELECT_RULES))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?
            .ok_or_else(|| not_found(id))?
            .into();

        let updated = current.with_update(update)?;

        sqlx::query(
            r#"
            UPDATE flight_rules
            SET name = ?, carrier_allow_list = ?, non_stop_only = ?, max_allowed_stops = ?, enabled = ?
            WHERE id = ?
            "#,
        )
        .bind(&updated.name)
        .bind(carriers_column(&updated.carrier_allow_list))
        .bind(updated.non_stop_only)
        .bind(updated.max_allowed_stops as i64)
        .bind(updated.enabled)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM flight_rules WHERE id = ?")
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

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use flightwatch_core::{CarrierAllowList, NewRule, Rule, RuleUpdate};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    /// Comma-separated carrier codes, e.g. `"AC, AZ"`. Empty admits any carrier.
    #[serde(default)]
    pub carriers: String,
    #[serde(default)]
    pub non_stop: bool,
    #[serde(default)]
    pub max_allowed_stops: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchRuleRequest {
    pub name: Option<String>,
    pub carriers: Option<String>,
    pub non_stop: Option<bool>,
    pub max_allowed_stops: Option<u32>,
    pub enabled: Option<bool>,
}

impl From<PatchRuleRequest> for RuleUpdate {
    fn from(req: PatchRuleRequest) -> Self {
        RuleUpdate {
            name: req.name,
            carrier_allow_list: req.carriers.as_deref().map(CarrierAllowList::parse),
            non_stop_only: req.non_stop,
            max_allowed_stops: req.max_allowed_stops,
            enabled: req.enabled,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rules", get(list_rules).post(create_rule))
        .route("/rules/{id}", patch(update_rule).delete(delete_rule))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /rules
async fn list_rules(State(state): State<AppState>) -> Result<Json<Vec<Rule>>, AppError> {
    Ok(Json(state.rules.list_all().await?))
}

/// POST /rules
async fn create_rule(
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<Rule>), AppError> {
    let new_rule = NewRule::new(
        req.name,
        CarrierAllowList::parse(&req.carriers),
        req.non_stop,
        req.max_allowed_stops,
    )?;

    let id = state.rules.insert(&new_rule).await?;
    let rule = state.rules.get(id).await?;
    info!("Created rule {} '{}'", rule.id, rule.name);

    Ok((StatusCode::CREATED, Json(rule)))
}

/// PATCH /rules/{id}
async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<PatchRuleRequest>,
) -> Result<Json<Rule>, AppError> {
    let update = RuleUpdate::from(req);
    if update.is_empty() {
        return Err(AppError::ValidationError("No fields to update".to_string()));
    }

    let rule = state.rules.update_fields(id, &update).await?;
    info!("Updated rule {} '{}'", rule.id, rule.name);
    Ok(Json(rule))
}

/// DELETE /rules/{id}
///
/// Also removes the rule's watches and their history.
async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    state.rules.delete(id).await?;
    info!("Deleted rule {}", id);
    Ok(StatusCode::NO_CONTENT)
}

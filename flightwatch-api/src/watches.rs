use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use flightwatch_core::{SearchParams, Watch, WatchSpec, WatchedResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateWatchRequest {
    pub rule_id: i64,
    #[serde(flatten)]
    pub search: SearchParams,
}

#[derive(Debug, Deserialize)]
pub struct PatchWatchRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RunWatchResponse {
    pub watch_id: i64,
    /// `None` when no offer matched the watch's rule.
    pub captured: Option<WatchedResult>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/watches", get(list_watches).post(create_watch))
        .route(
            "/watches/{id}",
            get(get_watch).patch(update_watch).delete(delete_watch),
        )
        .route("/watches/{id}/run", post(run_watch))
        .route("/watches/{id}/results", get(list_results))
}

// ============================================================================
// Watch Management Handlers
// ============================================================================

/// POST /watches
async fn create_watch(
    State(state): State<AppState>,
    Json(req): Json<CreateWatchRequest>,
) -> Result<(StatusCode, Json<Watch>), AppError> {
    let spec = WatchSpec::new(req.rule_id, req.search)?;
    let id = state.watches.insert(&spec).await?;
    let watch = state.watches.get(id).await?;
    info!(
        "Created watch {} {}->{} on {} (rule {})",
        watch.id, watch.origin, watch.destination, watch.depart_date, watch.rule_id
    );

    Ok((StatusCode::CREATED, Json(watch)))
}

/// GET /watches
async fn list_watches(State(state): State<AppState>) -> Result<Json<Vec<Watch>>, AppError> {
    Ok(Json(state.watches.list_all().await?))
}

/// GET /watches/{id}
async fn get_watch(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Watch>, AppError> {
    Ok(Json(state.watches.get(id).await?))
}

/// PATCH /watches/{id}
async fn update_watch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<PatchWatchRequest>,
) -> Result<Json<Watch>, AppError> {
    state.watches.set_enabled(id, req.enabled).await?;
    info!("Watch {} enabled={}", id, req.enabled);
    Ok(Json(state.watches.get(id).await?))
}

/// DELETE /watches/{id}
async fn delete_watch(State(state): State<AppState>, Path(id): Path<i64>) -> Result<StatusCode, AppError> {
    state.watches.delete(id).await?;
    info!("Deleted watch {}", id);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Execution & History Handlers
// ============================================================================

/// POST /watches/{id}/run
async fn run_watch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RunWatchResponse>, AppError> {
    let captured = state.runner.run(id).await?;
    Ok(Json(RunWatchResponse { watch_id: id, captured }))
}

/// GET /watches/{id}/results
async fn list_results(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<WatchedResult>>, AppError> {
    // 404 for unknown watches rather than an empty history
    state.watches.get(id).await?;
    Ok(Json(state.results.list_for_watch(id).await?))
}

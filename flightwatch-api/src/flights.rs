use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use flightwatch_core::watch::validate_search;
use flightwatch_core::{CandidateOffer, SearchParams};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/flights/search", post(search_flights))
}

/// POST /flights/search
///
/// Ad hoc search across every enabled rule. Nothing is persisted.
async fn search_flights(
    State(state): State<AppState>,
    Json(req): Json<SearchParams>,
) -> Result<Json<Vec<CandidateOffer>>, AppError> {
    let params = validate_search(req)?;
    let rules = state.rules.list_active().await?;

    let offers = state.orchestrator.run(&params, &rules).await?;
    info!(
        "Ad hoc search {}->{} on {} (±{}d): {} offers across {} rules",
        params.origin,
        params.destination,
        params.depart_date,
        params.flex_days,
        offers.len(),
        rules.len()
    );

    Ok(Json(offers))
}

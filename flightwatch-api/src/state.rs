use std::sync::Arc;

use flightwatch_core::repository::{ResultStore, RuleStore, WatchStore};
use flightwatch_offer::SearchOrchestrator;
use flightwatch_watch::WatchRunner;

#[derive(Clone)]
pub struct AppState {
    pub rules: Arc<dyn RuleStore>,
    pub watches: Arc<dyn WatchStore>,
    pub results: Arc<dyn ResultStore>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub runner: Arc<WatchRunner>,
}

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flightwatch_core::repository::{ResultStore, RuleStore, WatchStore};
use flightwatch_core::{CandidateOffer, CoreError, CoreResult, WatchedResult};
use flightwatch_offer::SearchOrchestrator;
use tracing::{debug, info};

/// Executes one watch: search with its bound rule, keep the cheapest match.
pub struct WatchRunner {
    watches: Arc<dyn WatchStore>,
    rules: Arc<dyn RuleStore>,
    results: Arc<dyn ResultStore>,
    orchestrator: Arc<SearchOrchestrator>,
    search_deadline: Option<Duration>,
}

impl WatchRunner {
    pub fn new(
        watches: Arc<dyn WatchStore>,
        rules: Arc<dyn RuleStore>,
        results: Arc<dyn ResultStore>,
        orchestrator: Arc<SearchOrchestrator>,
    ) -> Self {
        Self {
            watches,
            rules,
            results,
            orchestrator,
            search_deadline: None,
        }
    }

    /// Caps the wall time of the search phase of a run. Storing the capture is
    /// outside the deadline, so a timed-out run never leaves a result behind.
    pub fn with_search_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.search_deadline = deadline;
        self
    }

    /// Runs the watch and appends the cheapest matching offer to its history.
    ///
    /// Returns `Ok(None)` and writes nothing when no offer survives filtering.
    /// The bound rule is used even if the rule itself is disabled; only the
    /// watch's own flag gates execution.
    pub async fn run(&self, watch_id: i64) -> CoreResult<Option<WatchedResult>> {
        let watch = match self.watches.get(watch_id).await {
            Ok(watch) => watch,
            Err(CoreError::NotFound { .. }) => return Err(CoreError::WatchNotFound(watch_id)),
            Err(e) => return Err(e),
        };
        if !watch.enabled {
            return Err(CoreError::WatchDisabled(watch_id));
        }

        let rule = self.rules.get(watch.rule_id).await?;
        if !rule.enabled {
            debug!("Watch {} runs with disabled rule '{}'", watch_id, rule.name);
        }

        let search = watch.search_params();
        let rules = std::slice::from_ref(&rule);
        let candidates = match self.search_deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.orchestrator.run(&search, rules))
                .await
                .map_err(|_| CoreError::UpstreamTimeout(deadline))??,
            None => self.orchestrator.run(&search, rules).await?,
        };
        let considered = candidates.len();

        let Some(best) = pick_cheapest(candidates) else {
            info!("Watch {} ({}->{}): no matching offers", watch_id, watch.origin, watch.destination);
            return Ok(None);
        };

        let captured_at = Utc::now();
        let id = self.results.insert(watch.id, &best, captured_at).await?;
        info!(
            "Watch {} ({}->{}): captured cheapest of {} offers: {}",
            watch_id,
            watch.origin,
            watch.destination,
            considered,
            best.offer.summary()
        );

        Ok(Some(WatchedResult {
            id,
            watch_id: watch.id,
            rule_name: best.rule_name,
            captured_at,
            offer: best.offer,
        }))
    }
}

/// Lowest `total_price`; on ties the earliest candidate wins.
pub fn pick_cheapest(candidates: Vec<CandidateOffer>) -> Option<CandidateOffer> {
    let mut best: Option<CandidateOffer> = None;
    for candidate in candidates {
        match &best {
            Some(current) if candidate.offer.total_price >= current.offer.total_price => {}
            _ => best = Some(candidate),
        }
    }
    best
}

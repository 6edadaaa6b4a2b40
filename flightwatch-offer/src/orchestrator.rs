use std::sync::Arc;

use flightwatch_core::upstream::{RawOffer, UpstreamSearch};
use flightwatch_core::{CandidateOffer, CoreResult, DatePair, OfferQuery, Rule, SearchParams};
use tracing::{debug, warn};

use crate::dates::expand;
use crate::normalizer::normalize;
use crate::pacing::CallPacer;
use crate::retry::RetryPolicy;
use crate::rules::admits;

/// Offers requested per upstream call.
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Runs one search template against a rule set: dates × rules upstream calls,
/// normalized and filtered, in deterministic order.
pub struct SearchOrchestrator {
    upstream: Arc<dyn UpstreamSearch>,
    pacer: Arc<dyn CallPacer>,
    retry: RetryPolicy,
    max_results: u32,
}

impl SearchOrchestrator {
    pub fn new(upstream: Arc<dyn UpstreamSearch>, pacer: Arc<dyn CallPacer>) -> Self {
        Self {
            upstream,
            pacer,
            retry: RetryPolicy::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Every surviving offer, ordered by date pair, then rule, then upstream order.
    ///
    /// The same flight may appear once per matching (date pair, rule). Any upstream
    /// failure that outlives the retry policy aborts the whole run.
    pub async fn run(&self, params: &SearchParams, rules: &[Rule]) -> CoreResult<Vec<CandidateOffer>> {
        let date_pairs = expand(params.depart_date, params.return_date, params.flex_days)?;
        let mut candidates = Vec::new();

        for dates in &date_pairs {
            for rule in rules {
                let query = self.query_for(params, dates, rule);
                let raw_offers = self.search_with_retry(&query).await?;
                let before = candidates.len();

                for raw in &raw_offers {
                    let offer = match normalize(raw) {
                        Ok(offer) => offer,
                        Err(e) => {
                            warn!("Dropping offer for {}->{} on {}: {}", query.origin, query.destination, query.depart_date, e);
                            continue;
                        }
                    };
                    if admits(rule, &offer) {
                        candidates.push(CandidateOffer {
                            rule_name: rule.name.clone(),
                            offer,
                        });
                    }
                }

                debug!(
                    rule = %rule.name,
                    depart = %dates.depart,
                    returned = raw_offers.len(),
                    admitted = candidates.len() - before,
                    "upstream batch filtered"
                );
            }
        }

        Ok(candidates)
    }

    fn query_for(&self, params: &SearchParams, dates: &DatePair, rule: &Rule) -> OfferQuery {
        let mut query = params.query_for(dates, self.max_results);
        if rule.non_stop_only {
            query.non_stop = Some(true);
        }
        query.included_airline_codes = rule.carrier_allow_list.to_query_value();
        query
    }

    async fn search_with_retry(&self, query: &OfferQuery) -> CoreResult<Vec<RawOffer>> {
        let mut attempt = 1;
        loop {
            // Every attempt, retries included, waits for a permit.
            self.pacer.acquire().await;
            match self.upstream.search(query).await {
                Ok(offers) => return Ok(offers),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!("Upstream attempt {} failed ({}), retrying in {:?}", attempt, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use flightwatch_core::repository::{ResultStore, RuleStore, WatchStore};
use flightwatch_core::upstream::{RawOffer, UpstreamSearch};
use flightwatch_core::{
    CandidateOffer, CarrierAllowList, CoreError, CoreResult, NewRule, OfferQuery, Rule, RuleUpdate,
    SearchParams, TravelClass, Watch, WatchSpec, WatchedResult,
};
use flightwatch_offer::{RetryPolicy, SearchOrchestrator, Unpaced};
use flightwatch_watch::WatchRunner;
use serde_json::json;

#[derive(Default)]
pub struct MemoryRules {
    rows: Mutex<BTreeMap<i64, Rule>>,
}

impl MemoryRules {
    pub fn put(&self, rule: Rule) {
        self.rows.lock().unwrap().insert(rule.id, rule);
    }
}

#[async_trait]
impl RuleStore for MemoryRules {
    async fn list_active(&self) -> CoreResult<Vec<Rule>> {
        Ok(self.rows.lock().unwrap().values().filter(|r| r.enabled).cloned().collect())
    }

    async fn list_all(&self) -> CoreResult<Vec<Rule>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get(&self, id: i64) -> CoreResult<Rule> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound { entity: "rule", id })
    }

    async fn insert(&self, rule: &NewRule) -> CoreResult<i64> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.keys().last().copied().unwrap_or(0) + 1;
        rows.insert(
            id,
            Rule {
                id,
                name: rule.name.clone(),
                carrier_allow_list: rule.carrier_allow_list.clone(),
                non_stop_only: rule.non_stop_only,
                max_allowed_stops: rule.max_allowed_stops,
                enabled: true,
            },
        );
        Ok(id)
    }

    async fn update_fields(&self, id: i64, update: &RuleUpdate) -> CoreResult<Rule> {
        let mut rows = self.rows.lock().unwrap();
        let current = rows.get(&id).ok_or(CoreError::NotFound { entity: "rule", id })?;
        let updated = current.clone().with_update(update)?;
        rows.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryWatches {
    rows: Mutex<BTreeMap<i64, Watch>>,
}

#[async_trait]
impl WatchStore for MemoryWatches {
    async fn insert(&self, spec: &WatchSpec) -> CoreResult<i64> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.keys().last().copied().unwrap_or(0) + 1;
        let s = &spec.search;
        rows.insert(
            id,
            Watch {
                id,
                rule_id: spec.rule_id,
                rule_name: format!("rule {}", spec.rule_id),
                origin: s.origin.clone(),
                destination: s.destination.clone(),
                depart_date: s.depart_date,
                return_date: s.return_date,
                flex_days: s.flex_days,
                adults: s.adults,
                travel_class: s.travel_class,
                currency: s.currency.clone(),
                enabled: true,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn list_all(&self) -> CoreResult<Vec<Watch>> {
        Ok(self.rows.lock().unwrap().values().rev().cloned().collect())
    }

    async fn list_enabled(&self) -> CoreResult<Vec<Watch>> {
        Ok(self.rows.lock().unwrap().values().filter(|w| w.enabled).cloned().collect())
    }

    async fn get(&self, id: i64) -> CoreResult<Watch> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CoreError::NotFound { entity: "watch", id })
    }

    async fn set_enabled(&self, id: i64, enabled: bool) -> CoreResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let watch = rows.get_mut(&id).ok_or(CoreError::NotFound { entity: "watch", id })?;
        watch.enabled = enabled;
        Ok(())
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResults {
    rows: Mutex<Vec<WatchedResult>>,
}

impl MemoryResults {
    pub fn all(&self) -> Vec<WatchedResult> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultStore for MemoryResults {
    async fn insert(
        &self,
        watch_id: i64,
        candidate: &CandidateOffer,
        captured_at: DateTime<Utc>,
    ) -> CoreResult<i64> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(WatchedResult {
            id,
            watch_id,
            rule_name: candidate.rule_name.clone(),
            captured_at,
            offer: candidate.offer.clone(),
        });
        Ok(id)
    }

    async fn list_for_watch(&self, watch_id: i64) -> CoreResult<Vec<WatchedResult>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.watch_id == watch_id)
            .cloned()
            .collect())
    }
}

/// Answers each query through a closure and records what it was asked.
pub struct FakeUpstream {
    respond: Box<dyn Fn(&OfferQuery) -> CoreResult<Vec<RawOffer>> + Send + Sync>,
    delay: Duration,
    pub queries: Mutex<Vec<OfferQuery>>,
}

impl FakeUpstream {
    pub fn new(
        respond: impl Fn(&OfferQuery) -> CoreResult<Vec<RawOffer>> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::slow(Duration::ZERO, respond)
    }

    pub fn slow(
        delay: Duration,
        respond: impl Fn(&OfferQuery) -> CoreResult<Vec<RawOffer>> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            delay,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl UpstreamSearch for FakeUpstream {
    async fn search(&self, query: &OfferQuery) -> CoreResult<Vec<RawOffer>> {
        self.queries.lock().unwrap().push(query.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(query)
    }
}

/// Upstream-shaped offer with `stops + 1` outbound segments.
pub fn raw_offer(id: &str, carrier: &str, stops: usize, total: f64, depart: NaiveDate) -> RawOffer {
    raw_offer_lasting(id, carrier, stops, total, depart, "PT14H30M")
}

pub fn raw_offer_lasting(
    id: &str,
    carrier: &str,
    stops: usize,
    total: f64,
    depart: NaiveDate,
    duration: &str,
) -> RawOffer {
    let hubs = ["FRA", "FCO", "MUC"];
    let mut points = vec!["YYZ".to_string()];
    points.extend(hubs.iter().take(stops).map(|h| h.to_string()));
    points.push("SUF".to_string());

    let segments: Vec<_> = points
        .windows(2)
        .enumerate()
        .map(|(i, leg)| {
            json!({
                "departure": { "iataCode": leg[0], "at": format!("{}T{:02}:00:00", depart, 8 + i * 3) },
                "arrival": { "iataCode": leg[1], "at": format!("{}T{:02}:30:00", depart, 10 + i * 3) },
                "carrierCode": carrier,
                "number": format!("{}", 800 + i)
            })
        })
        .collect();

    RawOffer::new(json!({
        "id": id,
        "numberOfBookableSeats": 9,
        "itineraries": [{ "duration": duration, "segments": segments }],
        "price": { "currency": "CAD", "total": format!("{:.2}", total), "base": format!("{:.2}", total * 0.8) },
        "validatingAirlineCodes": [carrier]
    }))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn rule(id: i64, name: &str, carriers: &str, max_stops: u32, enabled: bool) -> Rule {
    Rule {
        id,
        name: name.into(),
        carrier_allow_list: CarrierAllowList::parse(carriers),
        non_stop_only: false,
        max_allowed_stops: max_stops,
        enabled,
    }
}

pub fn yyz_suf(depart: NaiveDate, flex_days: u32) -> SearchParams {
    SearchParams {
        origin: "YYZ".into(),
        destination: "SUF".into(),
        depart_date: depart,
        return_date: None,
        flex_days,
        adults: 1,
        travel_class: TravelClass::Economy,
        currency: "CAD".into(),
    }
}

pub struct Harness {
    pub rules: Arc<MemoryRules>,
    pub watches: Arc<MemoryWatches>,
    pub results: Arc<MemoryResults>,
    pub upstream: Arc<FakeUpstream>,
    pub orchestrator: Arc<SearchOrchestrator>,
    pub runner: Arc<WatchRunner>,
}

impl Harness {
    pub fn new(upstream: Arc<FakeUpstream>) -> Self {
        let rules = Arc::new(MemoryRules::default());
        let watches = Arc::new(MemoryWatches::default());
        let results = Arc::new(MemoryResults::default());
        let orchestrator = Arc::new(
            SearchOrchestrator::new(upstream.clone(), Arc::new(Unpaced)).with_retry(RetryPolicy::none()),
        );
        let runner = Arc::new(WatchRunner::new(
            watches.clone(),
            rules.clone(),
            results.clone(),
            orchestrator.clone(),
        ));
        Self {
            rules,
            watches,
            results,
            upstream,
            orchestrator,
            runner,
        }
    }

    /// A runner over the same stores whose search phase is capped at `deadline`.
    pub fn runner_with_deadline(&self, deadline: Duration) -> Arc<WatchRunner> {
        Arc::new(
            WatchRunner::new(
                self.watches.clone(),
                self.rules.clone(),
                self.results.clone(),
                self.orchestrator.clone(),
            )
            .with_search_deadline(Some(deadline)),
        )
    }

    pub async fn add_watch(&self, rule_id: i64, search: SearchParams) -> i64 {
        let spec = WatchSpec::new(rule_id, search).unwrap();
        self.watches.insert(&spec).await.unwrap()
    }
}

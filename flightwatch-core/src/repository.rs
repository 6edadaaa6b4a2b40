use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::offer::{CandidateOffer, WatchedResult};
use crate::rule::{NewRule, Rule, RuleUpdate};
use crate::watch::{Watch, WatchSpec};
use crate::CoreResult;

/// Repository trait for admission rules
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Enabled rules only, in id order.
    async fn list_active(&self) -> CoreResult<Vec<Rule>>;

    async fn list_all(&self) -> CoreResult<Vec<Rule>>;

    async fn get(&self, id: i64) -> CoreResult<Rule>;

    async fn insert(&self, rule: &NewRule) -> CoreResult<i64>;

    async fn update_fields(&self, id: i64, update: &RuleUpdate) -> CoreResult<Rule>;

    async fn delete(&self, id: i64) -> CoreResult<()>;
}

/// Repository trait for watches
#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn insert(&self, spec: &WatchSpec) -> CoreResult<i64>;

    /// Newest first.
    async fn list_all(&self) -> CoreResult<Vec<Watch>>;

    async fn list_enabled(&self) -> CoreResult<Vec<Watch>>;

    async fn get(&self, id: i64) -> CoreResult<Watch>;

    async fn set_enabled(&self, id: i64, enabled: bool) -> CoreResult<()>;

    async fn delete(&self, id: i64) -> CoreResult<()>;
}

/// Append-only log of captured results
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn insert(
        &self,
        watch_id: i64,
        candidate: &CandidateOffer,
        captured_at: DateTime<Utc>,
    ) -> CoreResult<i64>;

    /// Newest first.
    async fn list_for_watch(&self, watch_id: i64) -> CoreResult<Vec<WatchedResult>>;
}

/// A bearer token together with its absolute expiry (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: i64,
}

impl CachedToken {
    pub fn is_fresh(&self, now: i64, safety_margin_secs: i64) -> bool {
        now < self.expires_at - safety_margin_secs
    }
}

/// Single-row cache for the upstream access token
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> CoreResult<Option<CachedToken>>;

    /// Replaces the cached row only if it still equals `expected`
    /// (`None` meaning "no row yet"). Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        expected: Option<&CachedToken>,
        new: &CachedToken,
    ) -> CoreResult<bool>;
}

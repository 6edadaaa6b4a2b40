pub mod offer;
pub mod repository;
pub mod rule;
pub mod search;
pub mod upstream;
pub mod watch;

use std::time::Duration;

pub use offer::{CandidateOffer, Itinerary, NormalizedOffer, WatchedResult};
pub use rule::{CarrierAllowList, NewRule, Rule, RuleUpdate};
pub use search::{DatePair, OfferQuery, SearchParams, TravelClass};
pub use watch::{Watch, WatchSpec};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid date range: {0}")]
    InvalidRange(String),
    #[error("Malformed offer: {0}")]
    MalformedOffer(String),
    #[error("Upstream search failed: {message}")]
    UpstreamSearch {
        status: Option<u16>,
        message: String,
    },
    #[error("Upstream call timed out after {0:?}")]
    UpstreamTimeout(Duration),
    #[error("Upstream authentication failed: {0}")]
    Authentication(String),
    #[error("Watch not found: {0}")]
    WatchNotFound(i64),
    #[error("Watch is disabled: {0}")]
    WatchDisabled(i64),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Transport failures, throttling, server errors and timeouts are worth another attempt.
    /// Everything else is either the caller's fault or will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::UpstreamSearch { status: None, .. } => true,
            CoreError::UpstreamSearch { status: Some(code), .. } => *code == 429 || *code >= 500,
            CoreError::UpstreamTimeout(_) => true,
            _ => false,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

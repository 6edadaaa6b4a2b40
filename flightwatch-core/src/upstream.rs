use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::search::OfferQuery;
use crate::CoreResult;

/// One offer exactly as the upstream returned it. Only the normalizer looks inside.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawOffer(Value);

impl RawOffer {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawOffer {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A bearer token valid for at least the configured safety margin.
    async fn get_token(&self) -> CoreResult<SecretString>;
}

#[async_trait]
pub trait UpstreamSearch: Send + Sync {
    /// Runs a single flight-offers search. Non-2xx and transport failures surface as
    /// `CoreError::UpstreamSearch`, deadline overruns as `CoreError::UpstreamTimeout`.
    async fn search(&self, query: &OfferQuery) -> CoreResult<Vec<RawOffer>>;
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flightwatch_core::upstream::{RawOffer, TokenProvider, UpstreamSearch};
use flightwatch_core::{CoreError, CoreResult, OfferQuery};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const FLIGHT_OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Flight-offers search over HTTP, authenticated with the shared cached token.
pub struct AmadeusClient {
    client: Client,
    search_url: String,
    tokens: Arc<dyn TokenProvider>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct FlightOffersResponse {
    #[serde(default)]
    data: Vec<Value>,
}

impl AmadeusClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenProvider>, timeout: Duration) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::UpstreamSearch { status: None, message: e.to_string() })?;

        Ok(Self {
            client,
            search_url: format!("{}{}", base_url.trim_end_matches('/'), FLIGHT_OFFERS_PATH),
            tokens,
            timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            CoreError::UpstreamTimeout(self.timeout)
        } else {
            CoreError::UpstreamSearch {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

/// Query string for one search. Optional filters are left out entirely when unset.
pub fn query_params(query: &OfferQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("originLocationCode", query.origin.clone()),
        ("destinationLocationCode", query.destination.clone()),
        ("departureDate", query.depart_date.format("%Y-%m-%d").to_string()),
    ];
    if let Some(return_date) = query.return_date {
        params.push(("returnDate", return_date.format("%Y-%m-%d").to_string()));
    }
    params.push(("adults", query.adults.to_string()));
    params.push(("travelClass", query.travel_class.as_str().to_string()));
    if query.non_stop == Some(true) {
        params.push(("nonStop", "true".to_string()));
    }
    if let Some(codes) = &query.included_airline_codes {
        params.push(("includedAirlineCodes", codes.clone()));
    }
    params.push(("currencyCode", query.currency.clone()));
    params.push(("max", query.max_results.to_string()));
    params
}

#[async_trait]
impl UpstreamSearch for AmadeusClient {
    async fn search(&self, query: &OfferQuery) -> CoreResult<Vec<RawOffer>> {
        let token = self.tokens.get_token().await?;

        let response = self
            .client
            .get(&self.search_url)
            .bearer_auth(token.expose_secret())
            .query(&query_params(query))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(CoreError::UpstreamSearch {
                status: Some(status.as_u16()),
                message: error_msg,
            });
        }

        let body = response
            .json::<FlightOffersResponse>()
            .await
            .map_err(|e| self.transport_error(e))?;

        debug!(
            "{}->{} on {}: {} offers",
            query.origin,
            query.destination,
            query.depart_date,
            body.data.len()
        );
        Ok(body.data.into_iter().map(RawOffer::new).collect())
    }
}

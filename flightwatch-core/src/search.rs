use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Cabin requested from the upstream pricing API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl TravelClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelClass::Economy => "ECONOMY",
            TravelClass::PremiumEconomy => "PREMIUM_ECONOMY",
            TravelClass::Business => "BUSINESS",
            TravelClass::First => "FIRST",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ECONOMY" => Ok(TravelClass::Economy),
            "PREMIUM_ECONOMY" => Ok(TravelClass::PremiumEconomy),
            "BUSINESS" => Ok(TravelClass::Business),
            "FIRST" => Ok(TravelClass::First),
            other => Err(CoreError::ValidationError(format!("unknown travel class '{}'", other))),
        }
    }
}

/// A search template: what to look for, before date expansion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub flex_days: u32,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub travel_class: TravelClass,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_adults() -> u32 {
    1
}

fn default_currency() -> String {
    "CAD".to_string()
}

impl SearchParams {
    /// Upstream query for one expanded date pair, before any rule-specific narrowing.
    pub fn query_for(&self, dates: &DatePair, max_results: u32) -> OfferQuery {
        OfferQuery {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            depart_date: dates.depart,
            return_date: dates.return_date,
            adults: self.adults,
            travel_class: self.travel_class,
            non_stop: None,
            included_airline_codes: None,
            currency: self.currency.clone(),
            max_results,
        }
    }
}

/// One candidate (depart, return) combination produced by date expansion.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DatePair {
    pub depart: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

/// Everything the upstream flight-offers endpoint needs for a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferQuery {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
    pub travel_class: TravelClass,
    pub non_stop: Option<bool>,
    pub included_airline_codes: Option<String>,
    pub currency: String,
    pub max_results: u32,
}

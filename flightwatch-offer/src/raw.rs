//! Typed view of an Amadeus flight-offer payload.
//!
//! Only the fields the normalizer reads are modelled. Anything optional upstream is
//! `#[serde(default)]` here, so a payload only fails to parse when a field the
//! canonical offer cannot do without is missing.

use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AmadeusOffer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub number_of_bookable_seats: Option<u32>,
    pub itineraries: Vec<AmadeusItinerary>,
    pub price: AmadeusPrice,
    #[serde(default)]
    pub validating_airline_codes: Vec<String>,
    #[serde(default)]
    pub traveler_pricings: Vec<AmadeusTravelerPricing>,
}

#[derive(Deserialize, Debug)]
pub struct AmadeusItinerary {
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub segments: Vec<AmadeusSegment>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AmadeusSegment {
    pub departure: AmadeusEndpoint,
    pub arrival: AmadeusEndpoint,
    pub carrier_code: String,
    pub number: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AmadeusEndpoint {
    #[serde(default)]
    pub iata_code: Option<String>,
    pub at: NaiveDateTime,
}

/// Amounts arrive as decimal strings, e.g. `"546.70"`.
#[derive(Deserialize, Debug)]
pub struct AmadeusPrice {
    pub currency: String,
    pub total: String,
    #[serde(default)]
    pub base: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AmadeusTravelerPricing {
    #[serde(default)]
    pub fare_details_by_segment: Vec<AmadeusFareDetail>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AmadeusFareDetail {
    #[serde(default)]
    pub branded_fare_label: Option<String>,
    #[serde(default)]
    pub included_checked_bags: Option<AmadeusBagAllowance>,
    #[serde(default)]
    pub included_cabin_bags: Option<AmadeusBagAllowance>,
}

/// Allowances may be expressed by weight instead of count; only the count is kept.
#[derive(Deserialize, Debug)]
pub struct AmadeusBagAllowance {
    #[serde(default)]
    pub quantity: Option<u32>,
}


use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stop count given to an offer without any itinerary, so no rule can admit it.
pub const NO_ITINERARY_STOPS: u32 = u32::MAX;

/// Fare brand used when the upstream omits one.
pub const UNKNOWN_FARE_BRAND: &str = "UNKNOWN";

/// One direction of travel, reduced to what a watcher cares about.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Itinerary {
    pub flight_numbers: Vec<String>,
    pub stop_airports: Vec<String>,
    pub depart_time: Option<NaiveDateTime>,
    pub arrive_time: Option<NaiveDateTime>,
    /// ISO-8601 duration as reported upstream, e.g. `PT11H30M`.
    pub duration: Option<String>,
}

/// Canonical form of one upstream flight offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedOffer {
    pub offer_id: String,
    pub carrier: String,
    pub fare_brand: String,
    pub num_stops: u32,
    pub outbound: Itinerary,
    pub inbound: Option<Itinerary>,
    pub total_price: f64,
    pub base_price: f64,
    pub currency: String,
    pub checked_bags: u32,
    pub cabin_bags: u32,
    pub seats_left: u32,
}

impl NormalizedOffer {
    /// One-line human summary, used in capture logs.
    pub fn summary(&self) -> String {
        let routing = if self.num_stops == 0 {
            "DIRECT".to_string()
        } else if self.num_stops == NO_ITINERARY_STOPS {
            "no itinerary".to_string()
        } else {
            let plural = if self.num_stops == 1 { "" } else { "s" };
            format!(
                "{} stop{} ({})",
                self.num_stops,
                plural,
                self.outbound.stop_airports.join(" → ")
            )
        };

        let clock = |t: Option<NaiveDateTime>| {
            t.map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string())
        };

        format!(
            "{} {:.2} (base {:.2}) | {} | {} | {} → {} | {} | {}",
            self.currency,
            self.total_price,
            self.base_price,
            self.carrier,
            self.fare_brand,
            clock(self.outbound.depart_time),
            clock(self.outbound.arrive_time),
            self.outbound
                .duration
                .as_deref()
                .map(format_duration)
                .unwrap_or_else(|| "?".to_string()),
            routing,
        )
    }
}

/// A normalized offer that survived a rule, stamped with that rule's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateOffer {
    pub rule_name: String,
    #[serde(flatten)]
    pub offer: NormalizedOffer,
}

/// One periodic capture for a watch. Never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedResult {
    pub id: i64,
    pub watch_id: i64,
    pub rule_name: String,
    pub captured_at: DateTime<Utc>,
    #[serde(flatten)]
    pub offer: NormalizedOffer,
}

/// Renders an ISO-8601 duration (`PT11H30M`, `P1DT2H`) as `11h 30m`.
/// Returns the input unchanged when it cannot be read or the hours overflow.
pub fn format_duration(iso: &str) -> String {
    let Some(rest) = iso.strip_prefix('P') else {
        return iso.to_string();
    };

    let (mut hours, mut minutes) = (0u64, 0u64);
    let mut number = String::new();
    let mut in_time = false;
    for ch in rest.chars() {
        match ch {
            'T' => in_time = true,
            c if c.is_ascii_digit() => number.push(c),
            unit => {
                let Ok(value) = number.parse::<u64>() else {
                    return iso.to_string();
                };
                number.clear();
                let (slot, amount) = match (unit, in_time) {
                    ('D', false) => (&mut hours, value.checked_mul(24)),
                    ('H', true) => (&mut hours, Some(value)),
                    ('M', true) => (&mut minutes, Some(value)),
                    ('S', true) => continue,
                    _ => return iso.to_string(),
                };
                match amount.and_then(|a| slot.checked_add(a)) {
                    Some(total) => *slot = total,
                    None => return iso.to_string(),
                }
            }
        }
    }

    if minutes > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}h", hours)
    }
}

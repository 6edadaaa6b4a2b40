use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::search::{SearchParams, TravelClass};
use crate::{CoreError, CoreResult};

/// Upstream limit on travellers per request.
pub const MAX_ADULTS: u32 = 9;

/// Widest flex window accepted. Every extra day adds two upstream calls per rule.
pub const MAX_FLEX_DAYS: u32 = 14;

/// A persisted search template re-executed by the scheduler, bound to one rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Watch {
    pub id: i64,
    pub rule_id: i64,
    /// Name of the bound rule at read time.
    pub rule_name: String,
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub flex_days: u32,
    pub adults: u32,
    pub travel_class: TravelClass,
    pub currency: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Watch {
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            depart_date: self.depart_date,
            return_date: self.return_date,
            flex_days: self.flex_days,
            adults: self.adults,
            travel_class: self.travel_class,
            currency: self.currency.clone(),
        }
    }
}

/// Validated input for a new watch. New watches start enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSpec {
    pub rule_id: i64,
    pub search: SearchParams,
}

impl WatchSpec {
    pub fn new(rule_id: i64, search: SearchParams) -> CoreResult<Self> {
        Ok(Self {
            rule_id,
            search: validate_search(search)?,
        })
    }
}

/// Normalizes airport and currency codes and checks the fields the upstream would reject.
pub fn validate_search(mut search: SearchParams) -> CoreResult<SearchParams> {
    search.origin = airport_code(&search.origin, "origin")?;
    search.destination = airport_code(&search.destination, "destination")?;
    if search.origin == search.destination {
        return Err(CoreError::ValidationError(
            "origin and destination must differ".into(),
        ));
    }

    let currency = search.currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(format!(
            "'{}' is not an ISO currency code",
            search.currency
        )));
    }
    search.currency = currency;

    if search.adults == 0 || search.adults > MAX_ADULTS {
        return Err(CoreError::ValidationError(format!(
            "adults must be between 1 and {}",
            MAX_ADULTS
        )));
    }

    if search.flex_days > MAX_FLEX_DAYS {
        return Err(CoreError::ValidationError(format!(
            "flex_days must be at most {}",
            MAX_FLEX_DAYS
        )));
    }

    if let Some(ret) = search.return_date {
        if ret <= search.depart_date {
            return Err(CoreError::InvalidRange(
                "return date must be after depart date".into(),
            ));
        }
    }

    Ok(search)
}

fn airport_code(raw: &str, field: &str) -> CoreResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(CoreError::ValidationError(format!(
            "{} '{}' is not an IATA airport code",
            field, raw
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams {
            origin: "yyz".into(),
            destination: " SUF".into(),
            depart_date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            return_date: Some(NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()),
            flex_days: 1,
            adults: 1,
            travel_class: TravelClass::Economy,
            currency: "cad".into(),
        }
    }

    #[test]
    fn test_spec_normalizes_codes() {
        let spec = WatchSpec::new(3, params()).unwrap();
        assert_eq!(spec.search.origin, "YYZ");
        assert_eq!(spec.search.destination, "SUF");
        assert_eq!(spec.search.currency, "CAD");
    }

    #[test]
    fn test_spec_rejects_inverted_dates() {
        let mut p = params();
        p.return_date = Some(p.depart_date);
        assert!(matches!(WatchSpec::new(3, p), Err(CoreError::InvalidRange(_))));
    }

    #[test]
    fn test_spec_rejects_bad_fields() {
        let mut p = params();
        p.adults = 0;
        assert!(WatchSpec::new(3, p).is_err());

        let mut p = params();
        p.destination = "YYZ".into();
        assert!(WatchSpec::new(3, p).is_err());

        let mut p = params();
        p.origin = "TORONTO".into();
        assert!(WatchSpec::new(3, p).is_err());
    }

    #[test]
    fn test_flex_window_is_capped() {
        let mut p = params();
        p.flex_days = MAX_FLEX_DAYS;
        assert!(validate_search(p).is_ok());

        for flex_days in [MAX_FLEX_DAYS + 1, 50_000, u32::MAX] {
            let mut p = params();
            p.flex_days = flex_days;
            assert!(matches!(validate_search(p), Err(CoreError::ValidationError(_))));
        }
    }
}

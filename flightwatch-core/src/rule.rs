use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Highest stop ceiling a rule may carry. Anything above this is indistinguishable
/// from "any routing" for real itineraries and would let unparseable offers through.
pub const MAX_STOP_CEILING: u32 = 8;

/// Set of validating-carrier codes a rule admits. Empty means any carrier.
///
/// Entries are stored trimmed and upper-cased so membership is case-insensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CarrierAllowList(BTreeSet<String>);

impl CarrierAllowList {
    /// Parses a comma-separated list such as `"AC, az"`. Blank entries are ignored.
    pub fn parse(raw: &str) -> Self {
        Self::from_codes(raw.split(','))
    }

    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        Self(codes)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, carrier: &str) -> bool {
        self.0.contains(&carrier.trim().to_ascii_uppercase())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Comma-joined form used both for storage and for `includedAirlineCodes`.
    /// `None` when the list is empty.
    pub fn to_query_value(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.codes().collect::<Vec<_>>().join(","))
        }
    }
}

/// A named set of admission constraints applied to normalized offers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub id: i64,
    pub name: String,
    pub carrier_allow_list: CarrierAllowList,
    pub non_stop_only: bool,
    pub max_allowed_stops: u32,
    pub enabled: bool,
}

impl Rule {
    /// Effective stop ceiling: a non-stop rule never admits a connection,
    /// whatever `max_allowed_stops` says.
    pub fn stop_ceiling(&self) -> u32 {
        if self.non_stop_only {
            0
        } else {
            self.max_allowed_stops
        }
    }

    /// Returns the rule with `update` applied, re-validated as if newly created.
    pub fn with_update(self, update: &RuleUpdate) -> CoreResult<Rule> {
        let validated = NewRule::new(
            update.name.clone().unwrap_or(self.name),
            update
                .carrier_allow_list
                .clone()
                .unwrap_or(self.carrier_allow_list),
            update.non_stop_only.unwrap_or(self.non_stop_only),
            update.max_allowed_stops.unwrap_or(self.max_allowed_stops),
        )?;

        Ok(Rule {
            id: self.id,
            name: validated.name,
            carrier_allow_list: validated.carrier_allow_list,
            non_stop_only: validated.non_stop_only,
            max_allowed_stops: validated.max_allowed_stops,
            enabled: update.enabled.unwrap_or(self.enabled),
        })
    }
}

/// A validated rule that has not been persisted yet. New rules start enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub name: String,
    pub carrier_allow_list: CarrierAllowList,
    pub non_stop_only: bool,
    pub max_allowed_stops: u32,
}

impl NewRule {
    pub fn new(
        name: impl Into<String>,
        carrier_allow_list: CarrierAllowList,
        non_stop_only: bool,
        max_allowed_stops: u32,
    ) -> CoreResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::ValidationError("rule name must not be empty".into()));
        }
        if max_allowed_stops > MAX_STOP_CEILING {
            return Err(CoreError::ValidationError(format!(
                "max_allowed_stops must be at most {}, got {}",
                MAX_STOP_CEILING, max_allowed_stops
            )));
        }
        if let Some(bad) = carrier_allow_list
            .codes()
            .find(|c| c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_alphanumeric()))
        {
            return Err(CoreError::ValidationError(format!(
                "'{}' is not a two-character airline code",
                bad
            )));
        }

        Ok(Self {
            name,
            carrier_allow_list,
            non_stop_only,
            max_allowed_stops: if non_stop_only { 0 } else { max_allowed_stops },
        })
    }
}

/// Partial edit of a rule; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub carrier_allow_list: Option<CarrierAllowList>,
    pub non_stop_only: Option<bool>,
    pub max_allowed_stops: Option<u32>,
    pub enabled: Option<bool>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.carrier_allow_list.is_none()
            && self.non_stop_only.is_none()
            && self.max_allowed_stops.is_none()
            && self.enabled.is_none()
    }
}

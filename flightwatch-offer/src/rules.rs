use flightwatch_core::{NormalizedOffer, Rule};

/// Decides whether `offer` satisfies `rule`.
///
/// Only the carrier allow-list and the stop ceiling take part. Price, timing and
/// baggage are never admission criteria.
pub fn admits(rule: &Rule, offer: &NormalizedOffer) -> bool {
    if !rule.carrier_allow_list.is_empty() && !rule.carrier_allow_list.contains(&offer.carrier) {
        return false;
    }
    offer.num_stops <= rule.stop_ceiling()
}

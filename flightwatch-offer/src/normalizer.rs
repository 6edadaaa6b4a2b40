use flightwatch_core::offer::{NO_ITINERARY_STOPS, UNKNOWN_FARE_BRAND};
use flightwatch_core::upstream::RawOffer;
use flightwatch_core::{CoreError, CoreResult, Itinerary, NormalizedOffer};
use serde::Deserialize;

use crate::raw::{AmadeusBagAllowance, AmadeusFareDetail, AmadeusItinerary, AmadeusOffer};

/// Converts one upstream offer into its canonical form.
///
/// Pure: the same payload always yields the same offer. Fails with
/// `CoreError::MalformedOffer` when the payload lacks itineraries, a price, or a
/// validating carrier; callers drop such offers and carry on with the batch.
pub fn normalize(raw: &RawOffer) -> CoreResult<NormalizedOffer> {
    let offer = AmadeusOffer::deserialize(raw.as_value())
        .map_err(|e| CoreError::MalformedOffer(e.to_string()))?;

    let carrier = offer
        .validating_airline_codes
        .first()
        .cloned()
        .ok_or_else(|| malformed(&offer.id, "no validating airline"))?;

    let total_price = parse_amount(&offer.price.total)
        .ok_or_else(|| malformed(&offer.id, "unreadable total price"))?;
    let base_price = match offer.price.base.as_deref() {
        Some(base) => parse_amount(base).ok_or_else(|| malformed(&offer.id, "unreadable base price"))?,
        None => 0.0,
    };

    let fare = offer
        .traveler_pricings
        .first()
        .and_then(|tp| tp.fare_details_by_segment.first());
    let (checked_bags, cabin_bags) = baggage(fare);
    let fare_brand = fare
        .and_then(|f| f.branded_fare_label.clone())
        .unwrap_or_else(|| UNKNOWN_FARE_BRAND.to_string());

    let mut itineraries = offer.itineraries.iter().map(summarize);
    let outbound = itineraries.next().unwrap_or_default();
    let inbound = itineraries.next();

    Ok(NormalizedOffer {
        offer_id: offer.id.clone(),
        carrier,
        fare_brand,
        num_stops: count_stops(&offer.itineraries),
        outbound,
        inbound,
        total_price,
        base_price,
        currency: offer.price.currency.clone(),
        checked_bags,
        cabin_bags,
        seats_left: offer.number_of_bookable_seats.unwrap_or(0),
    })
}

/// Worst itinerary wins: a round trip with a direct outbound and a one-stop return
/// counts as one stop.
fn count_stops(itineraries: &[AmadeusItinerary]) -> u32 {
    itineraries
        .iter()
        .map(|it| it.segments.len().saturating_sub(1) as u32)
        .max()
        .unwrap_or(NO_ITINERARY_STOPS)
}

fn summarize(itinerary: &AmadeusItinerary) -> Itinerary {
    let segments = &itinerary.segments;
    let connections = segments.len().saturating_sub(1);

    Itinerary {
        flight_numbers: segments
            .iter()
            .map(|s| format!("{}{}", s.carrier_code, s.number))
            .collect(),
        stop_airports: segments[..connections]
            .iter()
            .filter_map(|s| s.arrival.iata_code.clone())
            .collect(),
        depart_time: segments.first().map(|s| s.departure.at),
        arrive_time: segments.last().map(|s| s.arrival.at),
        duration: itinerary.duration.clone(),
    }
}

fn baggage(fare: Option<&AmadeusFareDetail>) -> (u32, u32) {
    let Some(fare) = fare else {
        return (0, 0);
    };
    let count = |allowance: &Option<AmadeusBagAllowance>| {
        allowance.as_ref().and_then(|a| a.quantity).unwrap_or(0)
    };
    (count(&fare.included_checked_bags), count(&fare.included_cabin_bags))
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn malformed(offer_id: &str, reason: &str) -> CoreError {
    CoreError::MalformedOffer(format!("offer '{}': {}", offer_id, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn segment(carrier: &str, number: &str, from: &str, to: &str, dep: &str, arr: &str) -> Value {
        json!({
            "departure": { "iataCode": from, "at": dep },
            "arrival": { "iataCode": to, "at": arr },
            "carrierCode": carrier,
            "number": number
        })
    }

    fn offer(itineraries: Value) -> RawOffer {
        RawOffer::new(json!({
            "type": "flight-offer",
            "id": "42",
            "numberOfBookableSeats": 4,
            "itineraries": itineraries,
            "price": { "currency": "CAD", "total": "1234.56", "base": "900.00" },
            "validatingAirlineCodes": ["AC"],
            "travelerPricings": [{
                "fareDetailsBySegment": [{
                    "brandedFareLabel": "STANDARD",
                    "includedCheckedBags": { "quantity": 1 },
                    "includedCabinBags": { "quantity": 1 }
                }]
            }]
        }))
    }

    fn three_leg_outbound() -> Value {
        json!([{
            "duration": "PT16H5M",
            "segments": [
                segment("AC", "872", "YYZ", "FRA", "2026-08-10T17:00:00", "2026-08-11T06:50:00"),
                segment("AZ", "417", "FRA", "FCO", "2026-08-11T08:40:00", "2026-08-11T10:30:00"),
                segment("AZ", "1173", "FCO", "SUF", "2026-08-11T12:10:00", "2026-08-11T13:05:00")
            ]
        }])
    }

    #[test]
    fn test_three_segments_make_two_stops() {
        let normalized = normalize(&offer(three_leg_outbound())).unwrap();

        assert_eq!(normalized.num_stops, 2);
        assert_eq!(normalized.outbound.stop_airports, vec!["FRA", "FCO"]);
        assert_eq!(normalized.outbound.flight_numbers, vec!["AC872", "AZ417", "AZ1173"]);
        assert_eq!(
            normalized.outbound.depart_time,
            NaiveDate::from_ymd_opt(2026, 8, 10).unwrap().and_hms_opt(17, 0, 0)
        );
        assert_eq!(normalized.outbound.duration.as_deref(), Some("PT16H5M"));
        assert!(normalized.inbound.is_none());
        assert_eq!(normalized.carrier, "AC");
        assert_eq!(normalized.total_price, 1234.56);
        assert_eq!(normalized.base_price, 900.0);
        assert_eq!(normalized.fare_brand, "STANDARD");
        assert_eq!((normalized.checked_bags, normalized.cabin_bags), (1, 1));
        assert_eq!(normalized.seats_left, 4);
    }

    #[test]
    fn test_round_trip_uses_worst_direction() {
        let itineraries = json!([
            {
                "duration": "PT9H",
                "segments": [segment("AC", "890", "YYZ", "FCO", "2026-08-10T17:00:00", "2026-08-11T08:00:00")]
            },
            {
                "duration": "PT12H",
                "segments": [
                    segment("AC", "891", "SUF", "FCO", "2026-08-24T07:00:00", "2026-08-24T08:00:00"),
                    segment("AC", "893", "FCO", "YYZ", "2026-08-24T11:00:00", "2026-08-24T15:00:00")
                ]
            }
        ]);

        let normalized = normalize(&offer(itineraries)).unwrap();
        assert_eq!(normalized.num_stops, 1);
        assert!(normalized.outbound.stop_airports.is_empty());
        let inbound = normalized.inbound.expect("second itinerary present");
        assert_eq!(inbound.stop_airports, vec!["FCO"]);
        assert_eq!(inbound.flight_numbers, vec!["AC891", "AC893"]);
    }

    #[test]
    fn test_no_itineraries_gets_worst_case_stops() {
        let normalized = normalize(&offer(json!([]))).unwrap();
        assert_eq!(normalized.num_stops, NO_ITINERARY_STOPS);
        assert_eq!(normalized.outbound, Itinerary::default());
    }

    #[test]
    fn test_missing_fare_details_fall_back_to_defaults() {
        let raw = RawOffer::new(json!({
            "id": "7",
            "itineraries": three_leg_outbound(),
            "price": { "currency": "CAD", "total": "99.00" },
            "validatingAirlineCodes": ["AZ"]
        }));

        let normalized = normalize(&raw).unwrap();
        assert_eq!(normalized.fare_brand, UNKNOWN_FARE_BRAND);
        assert_eq!((normalized.checked_bags, normalized.cabin_bags), (0, 0));
        assert_eq!(normalized.base_price, 0.0);
        assert_eq!(normalized.seats_left, 0);
    }

    #[test]
    fn test_malformed_offers_are_errors() {
        let missing_itineraries = RawOffer::new(json!({
            "id": "1",
            "price": { "currency": "CAD", "total": "10.00" },
            "validatingAirlineCodes": ["AC"]
        }));
        assert!(matches!(normalize(&missing_itineraries), Err(CoreError::MalformedOffer(_))));

        let no_carrier = RawOffer::new(json!({
            "id": "2",
            "itineraries": [],
            "price": { "currency": "CAD", "total": "10.00" }
        }));
        assert!(matches!(normalize(&no_carrier), Err(CoreError::MalformedOffer(_))));

        let bad_price = RawOffer::new(json!({
            "id": "3",
            "itineraries": [],
            "price": { "currency": "CAD", "total": "ten" },
            "validatingAirlineCodes": ["AC"]
        }));
        assert!(matches!(normalize(&bad_price), Err(CoreError::MalformedOffer(_))));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = offer(three_leg_outbound());
        let first = serde_json::to_vec(&normalize(&raw).unwrap()).unwrap();
        let second = serde_json::to_vec(&normalize(&raw).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}

use chrono::{Days, NaiveDate};
use flightwatch_core::{CoreError, CoreResult, DatePair};

/// Expands a base trip into every (depart, return) pair within `flex_days` of it.
///
/// Pairs are ordered by offset, earliest first. A round trip keeps its length for
/// every shifted departure.
pub fn expand(
    depart: NaiveDate,
    return_date: Option<NaiveDate>,
    flex_days: u32,
) -> CoreResult<Vec<DatePair>> {
    let trip_length = match return_date {
        Some(ret) => {
            let days = (ret - depart).num_days();
            if days <= 0 {
                return Err(CoreError::InvalidRange(
                    "return date must be after depart date".into(),
                ));
            }
            Some(Days::new(days as u64))
        }
        None => None,
    };

    let flex = i64::from(flex_days);
    let mut pairs = Vec::with_capacity((2 * flex + 1) as usize);
    for offset in -flex..=flex {
        let shifted = shift(depart, offset)?;
        let return_date = match trip_length {
            Some(len) => Some(
                shifted
                    .checked_add_days(len)
                    .ok_or_else(|| out_of_calendar(shifted))?,
            ),
            None => None,
        };
        pairs.push(DatePair {
            depart: shifted,
            return_date,
        });
    }

    Ok(pairs)
}

fn shift(date: NaiveDate, offset: i64) -> CoreResult<NaiveDate> {
    let days = Days::new(offset.unsigned_abs());
    let shifted = if offset < 0 {
        date.checked_sub_days(days)
    } else {
        date.checked_add_days(days)
    };
    shifted.ok_or_else(|| out_of_calendar(date))
}

fn out_of_calendar(date: NaiveDate) -> CoreError {
    CoreError::InvalidRange(format!("date window around {} leaves the calendar", date))
}

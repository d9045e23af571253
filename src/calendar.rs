//! Month arithmetic for accounting periods and monthly due dates.

use serde::Deserialize;
use time::{Date, Month};

use crate::Error;

/// The earliest year accepted for an accounting period.
pub const MIN_YEAR: i32 = 2000;
/// The latest year accepted for an accounting period.
pub const MAX_YEAR: i32 = 2100;

/// Add `months` to the period `(year, month)`, rolling over into later years.
///
/// `month` is 1-based.
pub fn add_months(year: i32, month: u8, months: i64) -> (i32, u8) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + months;

    (index.div_euclid(12) as i32, (index.rem_euclid(12) + 1) as u8)
}

/// The period before `(month, year)`, returned as `(month, year)`.
pub fn previous_period(month: u8, year: i32) -> (u8, i32) {
    if month == 1 {
        (12, year - 1)
    } else {
        (month - 1, year)
    }
}

/// The date for `day` in the given month, clamped to the last day of the month.
///
/// For example, day 31 in February 2024 becomes 2024-02-29.
///
/// # Errors
/// Returns [Error::Validation] if `month` is not 1-12 or the year is out of
/// the range supported by [Date].
pub fn clamp_day(year: i32, month: u8, day: u8) -> Result<Date, Error> {
    let month = to_month(month)?;
    let last_day = time::util::days_in_year_month(year, month);

    Date::from_calendar_date(year, month, day.clamp(1, last_day))
        .map_err(|error| Error::Validation(error.to_string()))
}

/// The first date on or after `today` that falls on `day` of the month.
///
/// Months that are too short for `day` use their last day instead.
pub fn next_occurrence(today: Date, day: u8) -> Result<Date, Error> {
    let this_month = clamp_day(today.year(), today.month() as u8, day)?;

    if this_month >= today {
        return Ok(this_month);
    }

    let (year, month) = add_months(today.year(), today.month() as u8, 1);
    clamp_day(year, month, day)
}

fn to_month(month: u8) -> Result<Month, Error> {
    Month::try_from(month).map_err(|_| Error::Validation(format!("invalid month {month}")))
}

/// Check that `month` is between 1 and 12.
pub fn validate_month(month: u8) -> Result<(), Error> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "month must be between 1 and 12, got {month}"
        )))
    }
}

/// Check that `year` is between [MIN_YEAR] and [MAX_YEAR].
pub fn validate_year(year: i32) -> Result<(), Error> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
        )))
    }
}

/// Check that `day` is a plausible day of the month (1-31).
pub fn validate_day(day: u8) -> Result<(), Error> {
    if (1..=31).contains(&day) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "day must be between 1 and 31, got {day}"
        )))
    }
}

/// Check an accounting period.
pub fn validate_period(month: u8, year: i32) -> Result<(), Error> {
    validate_month(month)?;
    validate_year(year)
}

/// Optional month and year filters taken from the query string.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PeriodQuery {
    /// The month (1-12) to filter by.
    pub month: Option<u8>,
    /// The year to filter by.
    pub year: Option<i32>,
}

impl PeriodQuery {
    /// Check the filters that were given.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(month) = self.month {
            validate_month(month)?;
        }

        if let Some(year) = self.year {
            validate_year(year)?;
        }

        Ok(())
    }

    /// The period, using `today` for whichever of month and year is missing.
    pub fn or_today(&self, today: Date) -> (u8, i32) {
        (
            self.month.unwrap_or(today.month() as u8),
            self.year.unwrap_or(today.year()),
        )
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{
        PeriodQuery, add_months, clamp_day, next_occurrence, previous_period, validate_period,
    };

    #[test]
    fn add_months_within_year() {
        assert_eq!(add_months(2024, 3, 2), (2024, 5));
    }

    #[test]
    fn add_months_rolls_over_year() {
        assert_eq!(add_months(2024, 11, 3), (2025, 2));
        assert_eq!(add_months(2024, 12, 1), (2025, 1));
        assert_eq!(add_months(2024, 1, 24), (2026, 1));
    }

    #[test]
    fn add_zero_months_is_identity() {
        assert_eq!(add_months(2024, 7, 0), (2024, 7));
    }

    #[test]
    fn add_negative_months() {
        assert_eq!(add_months(2024, 1, -1), (2023, 12));
    }

    #[test]
    fn previous_period_of_january_is_december() {
        assert_eq!(previous_period(1, 2025), (12, 2024));
        assert_eq!(previous_period(6, 2025), (5, 2025));
    }

    #[test]
    fn clamp_day_to_end_of_short_month() {
        assert_eq!(clamp_day(2024, 2, 31), Ok(date!(2024 - 02 - 29)));
        assert_eq!(clamp_day(2023, 2, 31), Ok(date!(2023 - 02 - 28)));
        assert_eq!(clamp_day(2024, 4, 31), Ok(date!(2024 - 04 - 30)));
    }

    #[test]
    fn clamp_day_keeps_valid_day() {
        assert_eq!(clamp_day(2024, 1, 15), Ok(date!(2024 - 01 - 15)));
    }

    #[test]
    fn clamp_day_rejects_invalid_month() {
        assert!(matches!(clamp_day(2024, 13, 1), Err(Error::Validation(_))));
    }

    #[test]
    fn next_occurrence_later_this_month() {
        assert_eq!(
            next_occurrence(date!(2024 - 05 - 10), 20),
            Ok(date!(2024 - 05 - 20))
        );
    }

    #[test]
    fn next_occurrence_today() {
        assert_eq!(
            next_occurrence(date!(2024 - 05 - 10), 10),
            Ok(date!(2024 - 05 - 10))
        );
    }

    #[test]
    fn next_occurrence_next_month() {
        assert_eq!(
            next_occurrence(date!(2024 - 01 - 31), 5),
            Ok(date!(2024 - 02 - 05))
        );
        assert_eq!(
            next_occurrence(date!(2024 - 12 - 20), 5),
            Ok(date!(2025 - 01 - 05))
        );
    }

    #[test]
    fn next_occurrence_clamps_in_short_month() {
        assert_eq!(
            next_occurrence(date!(2025 - 02 - 10), 31),
            Ok(date!(2025 - 02 - 28))
        );
    }

    #[test]
    fn validate_period_bounds() {
        assert!(validate_period(1, 2000).is_ok());
        assert!(validate_period(12, 2100).is_ok());
        assert!(validate_period(0, 2024).is_err());
        assert!(validate_period(13, 2024).is_err());
        assert!(validate_period(5, 1999).is_err());
        assert!(validate_period(5, 2101).is_err());
    }

    #[test]
    fn period_query_fills_in_today() {
        let query = PeriodQuery {
            month: None,
            year: Some(2023),
        };

        assert_eq!(query.or_today(date!(2025 - 03 - 14)), (3, 2023));
    }

    #[test]
    fn period_query_rejects_bad_month() {
        let query = PeriodQuery {
            month: Some(13),
            year: None,
        };

        assert!(matches!(query.validate(), Err(Error::Validation(_))));
    }
}

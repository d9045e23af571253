use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current date in `canonical_timezone`, e.g. "America/Santiago".
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the timezone name is unknown.
pub fn today(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::Error;

    use super::today;

    #[test]
    fn today_in_utc_matches_system_clock() {
        let want = OffsetDateTime::now_utc().date();

        let got = today("Etc/UTC").unwrap();

        // Allow for the test running across midnight.
        assert!(got == want || got == want.next_day().unwrap());
    }

    #[test]
    fn today_fails_on_unknown_timezone() {
        assert_eq!(
            today("Nowhere/Special"),
            Err(Error::InvalidTimezoneError("Nowhere/Special".to_owned()))
        );
    }
}

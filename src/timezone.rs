//! Converting between UTC and the bank's local time.

use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use time_tz::{OffsetDateTimeExt, PrimitiveDateTimeExt, Tz, timezones};

use crate::Error;

/// Look up `canonical_timezone`, e.g. "Europe/Minsk", in the IANA database.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] for names missing from the IANA database.
pub fn get_timezone(canonical_timezone: &str) -> Result<&'static Tz, Error> {
    timezones::get_by_name(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))
}

/// Today's date in `canonical_timezone`.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    Ok(OffsetDateTime::now_utc()
        .to_timezone(get_timezone(canonical_timezone)?)
        .date())
}

/// The UTC instant at which `date` begins in `timezone`.
///
/// The offset is the one in force on that date, so days next to a daylight
/// saving change are 23 or 25 hours long. Where clocks skip midnight, the day
/// begins at the first instant after the gap.
pub fn start_of_local_day(date: Date, timezone: &Tz) -> OffsetDateTime {
    let midnight = PrimitiveDateTime::new(date, Time::MIDNIGHT);

    midnight
        .assume_timezone(timezone)
        .take_first()
        .unwrap_or_else(|| midnight.assume_timezone_utc(timezone))
        .to_offset(UtcOffset::UTC)
}

#[cfg(test)]
mod timezone_tests {
    use time::macros::{date, datetime};

    use crate::Error;

    use super::{get_timezone, local_today, start_of_local_day};

    #[test]
    fn minsk_day_starts_three_hours_before_utc() {
        let minsk = get_timezone("Europe/Minsk").unwrap();

        assert_eq!(
            start_of_local_day(date!(2025 - 03 - 01), minsk),
            datetime!(2025-02-28 21:00 UTC)
        );
    }

    #[test]
    fn offset_follows_daylight_saving() {
        let berlin = get_timezone("Europe/Berlin").unwrap();

        assert_eq!(
            start_of_local_day(date!(2025 - 01 - 15), berlin),
            datetime!(2025-01-14 23:00 UTC)
        );
        assert_eq!(
            start_of_local_day(date!(2025 - 07 - 15), berlin),
            datetime!(2025-07-14 22:00 UTC)
        );
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_today("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }
}

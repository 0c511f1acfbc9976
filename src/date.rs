//! Interpretation of the relaxed "cookie-date" format accepted in `Expires`
//! attributes (RFC 6265 §5.1.1).
//!
//! A cookie-date is not a fixed pattern but a bag of tokens: the input is
//! split on every character that is not an ASCII alphanumeric or `:`, and
//! each token is tested against the time-of-day, month, day-of-month, and
//! year slots in that order. Each slot is filled at most once by the first
//! token that matches it.

use std::error::Error;
use std::fmt;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// The shape emitted for `Expires` values: `Sat, 04 Jan 2020 12:00:00 GMT`.
pub(crate) static EXPIRES_FORMAT: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Errors that can occur while interpreting a cookie-date string.
///
/// The two variants separate "the input could not be read as a date at all"
/// from "every field was found but one of them is out of range". Callers that
/// reach this through `Set-Cookie` parsing treat both the same way: the
/// `Expires` attribute is dropped and the cookie parse continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateError {
    /// The input did not yield all four of time, day of month, month, and
    /// year.
    Incomplete,
    /// All four fields were found, but one of them violates its range.
    OutOfRange(&'static str),
}

impl DateError {
    /// Returns a description of this error as a string.
    pub fn as_str(&self) -> &'static str {
        match *self {
            DateError::Incomplete => "missing a time, day of month, month, or year",
            DateError::OutOfRange(reason) => reason,
        }
    }
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error for DateError {}

/// Matches a 1-2 digit field of a time token.
fn time_field(field: &str) -> Option<u8> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    field.parse().ok()
}

/// Matches `hh:mm:ss` with 1-2 digit fields. The whole token must match.
fn match_time(token: &str) -> Option<(u8, u8, u8)> {
    let mut fields = token.split(':');
    let hour = time_field(fields.next()?)?;
    let minute = time_field(fields.next()?)?;
    let second = time_field(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }

    Some((hour, minute, second))
}

/// Matches one of the twelve three-letter month abbreviations,
/// case-insensitively.
fn match_month(token: &str) -> Option<Month> {
    if token.len() != 3 {
        return None;
    }

    let month = match token.to_ascii_lowercase().as_str() {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };

    Some(month)
}

/// Matches a run of `min..=max` decimal digits. The whole token must match.
fn match_number(token: &str, min: usize, max: usize) -> Option<u16> {
    if token.len() < min || token.len() > max || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    token.parse().ok()
}

/// Interprets a cookie-date string as a UTC timestamp.
///
/// Tokens are maximal runs of ASCII alphanumerics and `:`; everything else is
/// a delimiter. Each token is tested against the four slots in priority order
/// (time, month, day of month, year) and assigned to the first unfilled slot
/// it matches; a filled slot is never overwritten. Two-digit years 70-99 are
/// the 1900s and 0-69 the 2000s.
///
/// The day of month is range-checked against `[1, 31]` but deliberately not
/// against the resolved month, so `Feb 31` is accepted and rolls forward into
/// March.
///
/// # Example
///
/// ```rust
/// use setcookie::parse_cookie_date;
/// use time::macros::datetime;
///
/// let parsed = parse_cookie_date("Tue, 07-Feb-2023 13:20:04 GMT").unwrap();
/// assert_eq!(parsed, datetime!(2023-02-07 13:20:04 UTC));
/// ```
pub fn parse_cookie_date(s: &str) -> Result<OffsetDateTime, DateError> {
    let mut time_of_day = None;
    let mut month = None;
    let mut day_of_month = None;
    let mut year = None;

    let tokens = s
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == ':'))
        .filter(|token| !token.is_empty());

    for token in tokens {
        if time_of_day.is_none() {
            if let Some(found) = match_time(token) {
                time_of_day = Some(found);
                continue;
            }
        }

        if month.is_none() {
            if let Some(found) = match_month(token) {
                month = Some(found);
                continue;
            }
        }

        if day_of_month.is_none() {
            if let Some(found) = match_number(token, 1, 2) {
                day_of_month = Some(found);
                continue;
            }
        }

        if year.is_none() {
            if let Some(found) = match_number(token, 2, 4) {
                year = Some(i32::from(found));
            }
        }
    }

    let (time_of_day, month, day, year) = match (time_of_day, month, day_of_month, year) {
        (Some(t), Some(m), Some(d), Some(y)) => (t, m, d, y),
        _ => return Err(DateError::Incomplete),
    };

    // Two-digit years: 70-99 are the 1900s, 0-69 the 2000s.
    let year = match year {
        70..=99 => year + 1900,
        0..=69 => year + 2000,
        _ => year,
    };

    if day < 1 || day > 31 {
        return Err(DateError::OutOfRange("day of month is not between 1 and 31"));
    }
    if year < 1601 {
        return Err(DateError::OutOfRange("year is before 1601"));
    }

    let (hour, minute, second) = time_of_day;
    if hour > 23 {
        return Err(DateError::OutOfRange("hour is greater than 23"));
    }
    if minute > 59 {
        return Err(DateError::OutOfRange("minute is greater than 59"));
    }
    if second > 59 {
        return Err(DateError::OutOfRange("second is greater than 59"));
    }

    let date = Date::from_calendar_date(year, month, 1)
        .map_err(|_| DateError::OutOfRange("year is out of range"))?
        + Duration::days(i64::from(day) - 1);
    let time = Time::from_hms(hour, minute, second)
        .map_err(|_| DateError::OutOfRange("time of day is out of range"))?;

    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}

#[cfg(test)]
mod tests {
    use super::{parse_cookie_date, DateError};
    use time::macros::datetime;

    #[test]
    fn rfc1123_style() {
        assert_eq!(
            parse_cookie_date("Tue, 07-Feb-2023 13:20:04 GMT"),
            Ok(datetime!(2023-02-07 13:20:04 UTC))
        );
        assert_eq!(
            parse_cookie_date("Tue, 25-Aug-2003 17:45:04 GMT"),
            Ok(datetime!(2003-08-25 17:45:04 UTC))
        );
        assert_eq!(
            parse_cookie_date("Wed, 21 Oct 2015 07:28:00 GMT"),
            Ok(datetime!(2015-10-21 07:28:00 UTC))
        );
    }

    #[test]
    fn token_order_is_irrelevant() {
        assert_eq!(
            parse_cookie_date("2023 13:20:04 Feb 07"),
            Ok(datetime!(2023-02-07 13:20:04 UTC))
        );
    }

    #[test]
    fn two_digit_years() {
        assert_eq!(
            parse_cookie_date("Thu, 01-Jan-70 00:00:00 GMT"),
            Ok(datetime!(1970-01-01 00:00:00 UTC))
        );
        assert_eq!(
            parse_cookie_date("Wed, 01-Jan-69 00:00:00 GMT"),
            Ok(datetime!(2069-01-01 00:00:00 UTC))
        );
        assert_eq!(
            parse_cookie_date("01-Jan-99 00:00:00"),
            Ok(datetime!(1999-01-01 00:00:00 UTC))
        );
    }

    #[test]
    fn filled_slots_are_never_overwritten() {
        // "08" would also match the day slot; it must land in the year slot
        // and become 2008 instead of replacing the day.
        assert_eq!(
            parse_cookie_date("07 Feb 08 13:20:04"),
            Ok(datetime!(2008-02-07 13:20:04 UTC))
        );
    }

    #[test]
    fn day_overflow_rolls_into_next_month() {
        assert_eq!(
            parse_cookie_date("Tue, 31-Feb-2023 13:20:04 GMT"),
            Ok(datetime!(2023-03-03 13:20:04 UTC))
        );
    }

    #[test]
    fn missing_fields() {
        assert_eq!(parse_cookie_date(""), Err(DateError::Incomplete));
        assert_eq!(parse_cookie_date("07-Feb-2023"), Err(DateError::Incomplete));
        assert_eq!(
            parse_cookie_date("13:20:04 GMT"),
            Err(DateError::Incomplete)
        );
        assert_eq!(
            parse_cookie_date("not a date at all"),
            Err(DateError::Incomplete)
        );
    }

    #[test]
    fn range_violations() {
        assert!(matches!(
            parse_cookie_date("Tue, 32-Feb-2023 13:20:04 GMT"),
            Err(DateError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_cookie_date("Tue, 00-Feb-2023 13:20:04 GMT"),
            Err(DateError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_cookie_date("Tue, 07-Feb-1600 13:20:04 GMT"),
            Err(DateError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_cookie_date("Tue, 07-Feb-2023 25:20:04 GMT"),
            Err(DateError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_cookie_date("Tue, 07-Feb-2023 13:60:04 GMT"),
            Err(DateError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_cookie_date("Tue, 07-Feb-2023 13:20:60 GMT"),
            Err(DateError::OutOfRange(_))
        ));
    }
}

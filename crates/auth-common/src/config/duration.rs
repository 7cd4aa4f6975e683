//! Human-readable duration strings (`JWT_EXPIRES=2h`)
//!
//! Accepts a number followed by an optional unit. A bare number is seconds.
//! Fractions are allowed (`1.5h`); whitespace between number and unit is
//! ignored and units are case-insensitive.

use std::time::Duration;

const MILLISECOND: f64 = 1.0;
const SECOND: f64 = 1000.0 * MILLISECOND;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;
const YEAR: f64 = 365.25 * DAY;

/// Duration parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,

    #[error("invalid number in duration: {0:?}")]
    InvalidNumber(String),

    #[error("unknown duration unit: {0:?}")]
    UnknownUnit(String),

    #[error("duration out of range: {0:?}")]
    OutOfRange(String),
}

/// Parse a duration such as `3600`, `90s`, `15m`, `2h`, `7d`, `1w`, `500ms`
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(DurationParseError::InvalidNumber(trimmed.to_string()));
    }
    let value: f64 = number
        .parse()
        .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;

    let millis_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => MILLISECOND,
        "" | "s" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        other => return Err(DurationParseError::UnknownUnit(other.to_string())),
    };

    Duration::try_from_secs_f64(value * millis_per_unit / 1000.0)
        .map_err(|_| DurationParseError::OutOfRange(trimmed.to_string()))
}

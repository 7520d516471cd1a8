//! Token lifetime parsing.
//!
//! Two notations are accepted, tried in order:
//!
//! 1. A native duration string: one or more `<number><unit>` groups with
//!    units `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. Numbers may carry a
//!    fraction. Examples: `72h`, `1h30m`, `1.5h`, `90s`.
//! 2. A compact `<integer><unit>` form for longer lifetimes, with units
//!    `h` (hours), `d` (days), `w` (weeks) and `y` (365-day years).
//!    Examples: `7d`, `2w`, `1y`.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const SECS_PER_HOUR: u64 = 60 * 60;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const SECS_PER_WEEK: u64 = 7 * SECS_PER_DAY;
const SECS_PER_YEAR: u64 = 365 * SECS_PER_DAY;

static COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)([a-zA-Z])$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("input does not match expected format")]
    Format,

    #[error("unknown time unit: {0}")]
    UnknownUnit(String),

    #[error("duration is too large")]
    Overflow,
}

/// Parse a token lifetime in either accepted notation.
pub fn parse_token_duration(input: &str) -> Result<Duration, DurationParseError> {
    let input = input.trim();
    if let Some(d) = parse_native(input)? {
        return Ok(d);
    }
    parse_compact(input)
}

/// `Ok(None)` means the input is not in native notation at all.
fn parse_native(input: &str) -> Result<Option<Duration>, DurationParseError> {
    let rest = input.strip_prefix('+').unwrap_or(input);
    if rest == "0" {
        return Ok(Some(Duration::ZERO));
    }
    if rest.is_empty() {
        return Ok(None);
    }

    let mut total: u128 = 0;
    let mut chars = rest.char_indices().peekable();

    while chars.peek().is_some() {
        let start = chars.peek().map(|&(i, _)| i).unwrap_or(rest.len());
        while chars.next_if(|&(_, c)| c.is_ascii_digit() || c == '.').is_some() {}
        let unit_start = chars.peek().map(|&(i, _)| i).unwrap_or(rest.len());
        while chars.next_if(|&(_, c)| !c.is_ascii_digit() && c != '.').is_some() {}
        let end = chars.peek().map(|&(i, _)| i).unwrap_or(rest.len());

        let number = &rest[start..unit_start];
        let unit = &rest[unit_start..end];

        let Some(per_unit) = native_unit_nanos(unit) else {
            return Ok(None);
        };
        let Some(nanos) = scale(number, per_unit) else {
            return Ok(None);
        };
        total = total
            .checked_add(nanos)
            .ok_or(DurationParseError::Overflow)?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| DurationParseError::Overflow)?;
    let subsec = (total % NANOS_PER_SEC) as u32;
    Ok(Some(Duration::new(secs, subsec)))
}

fn native_unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(u128::from(SECS_PER_HOUR) * NANOS_PER_SEC),
        _ => None,
    }
}

/// `"1.25"` scaled by `per_unit`, truncating below one nanosecond.
fn scale(number: &str, per_unit: u128) -> Option<u128> {
    let (whole, frac) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(per_unit)?;

    let mut divisor: u128 = 1;
    let mut frac_value: u128 = 0;
    for c in frac.chars() {
        let digit = c.to_digit(10)?;
        // Digits beyond nanosecond resolution of the largest unit add nothing.
        if divisor >= 10u128.pow(18) {
            break;
        }
        frac_value = frac_value * 10 + u128::from(digit);
        divisor *= 10;
    }
    nanos = nanos.checked_add(frac_value.checked_mul(per_unit)? / divisor)?;
    Some(nanos)
}

fn parse_compact(input: &str) -> Result<Duration, DurationParseError> {
    let caps = COMPACT_RE
        .captures(input)
        .ok_or(DurationParseError::Format)?;

    let amount: u64 = caps[1].parse().map_err(|_| DurationParseError::Format)?;
    let unit = &caps[2];

    let multiplier = match unit {
        "h" => SECS_PER_HOUR,
        "d" => SECS_PER_DAY,
        "w" => SECS_PER_WEEK,
        "y" => SECS_PER_YEAR,
        other => return Err(DurationParseError::UnknownUnit(other.to_string())),
    };

    let secs = amount
        .checked_mul(multiplier)
        .ok_or(DurationParseError::Overflow)?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(n: u64) -> Duration {
        Duration::from_secs(n * SECS_PER_HOUR)
    }

    #[test]
    fn native_hours() {
        assert_eq!(parse_token_duration("72h"), Ok(hours(72)));
    }

    #[test]
    fn native_compound_and_fractional() {
        assert_eq!(
            parse_token_duration("1h30m"),
            Ok(Duration::from_secs(90 * 60))
        );
        assert_eq!(
            parse_token_duration("1.5h"),
            Ok(Duration::from_secs(90 * 60))
        );
        assert_eq!(
            parse_token_duration("250ms"),
            Ok(Duration::from_millis(250))
        );
        assert_eq!(parse_token_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn compact_days_weeks_years() {
        assert_eq!(parse_token_duration("7d"), Ok(hours(7 * 24)));
        assert_eq!(parse_token_duration("2w"), Ok(hours(14 * 24)));
        assert_eq!(parse_token_duration("1y"), Ok(hours(365 * 24)));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_token_duration(" 3d\n"), Ok(hours(72)));
    }

    #[test]
    fn unknown_compact_unit() {
        assert_eq!(
            parse_token_duration("3x"),
            Err(DurationParseError::UnknownUnit("x".into()))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        for input in ["", "abc", "h", "3", "1.5d", "-1h", "1h2x", "3dd"] {
            assert_eq!(
                parse_token_duration(input),
                Err(DurationParseError::Format),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn huge_compact_value_overflows() {
        assert_eq!(
            parse_token_duration("99999999999999999y"),
            Err(DurationParseError::Overflow)
        );
    }
}

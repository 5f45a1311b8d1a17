//! Custom parser backing time-typed flags (§4.2): RFC 3339, ISO 8601,
//! Go-style durations, and signed offsets suffixed `d`/`mo`/`y` (days,
//! months, years) relative to a pluggable "now" clock (§9 Design Notes,
//! "Global clock").

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use std::fmt;

pub type NowFn = fn() -> DateTime<Utc>;

pub fn system_now() -> DateTime<Utc> {
    Utc::now()
}

#[derive(Debug)]
pub struct TimeParseError(pub String);

impl fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse {:?} as a time value", self.0)
    }
}

impl std::error::Error for TimeParseError {}

/// Parses `input` against `now`, trying each accepted form in turn:
/// RFC 3339 / ISO 8601 timestamp, a signed `d`/`mo`/`y` offset, then a
/// duration in Go/humantime syntax (interpreted as "that long from now",
/// after stripping an optional leading `+`).
pub fn parse_time_value(input: &str, now: impl Fn() -> DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Some(offset) = parse_signed_offset(trimmed) {
        return Ok(apply_offset(now(), offset));
    }

    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if let Ok(duration) = humantime::parse_duration(unsigned) {
        let chrono_duration =
            Duration::from_std(duration).map_err(|e| TimeParseError(format!("{trimmed}: {e}")))?;
        return Ok(now() + chrono_duration);
    }

    Err(TimeParseError(trimmed.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetUnit {
    Days,
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SignedOffset {
    amount: i64,
    unit: OffsetUnit,
}

fn parse_signed_offset(input: &str) -> Option<SignedOffset> {
    let (amount_str, unit) = if let Some(prefix) = input.strip_suffix("mo") {
        (prefix, OffsetUnit::Months)
    } else if let Some(prefix) = input.strip_suffix('d') {
        (prefix, OffsetUnit::Days)
    } else if let Some(prefix) = input.strip_suffix('y') {
        (prefix, OffsetUnit::Years)
    } else {
        return None;
    };
    let amount: i64 = amount_str.parse().ok()?;
    Some(SignedOffset { amount, unit })
}

fn apply_offset(now: DateTime<Utc>, offset: SignedOffset) -> DateTime<Utc> {
    match offset.unit {
        OffsetUnit::Days => now + Duration::days(offset.amount),
        OffsetUnit::Months => {
            let total_months = now.date_naive().year() as i64 * 12 + now.date_naive().month0() as i64 + offset.amount;
            let year = total_months.div_euclid(12) as i32;
            let month0 = total_months.rem_euclid(12) as u32;
            shift_date(now, year, month0)
        }
        OffsetUnit::Years => {
            let year = now.date_naive().year() + offset.amount as i32;
            shift_date(now, year, now.date_naive().month0())
        }
    }
}

fn shift_date(now: DateTime<Utc>, year: i32, month0: u32) -> DateTime<Utc> {
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    let day = now.date_naive().day().min(28);
    let date = NaiveDate::from_ymd_opt(year, month0 + 1, day).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(year, month0 + 1, 1).expect("month0+1 is always a valid month number")
    });
    let naive = date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    Utc.from_utc_datetime(&naive).with_timezone(&Utc) + (now.time() - NaiveTime::from_hms_opt(0, 0, 0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_time_value("2026-01-01T00:00:00Z", fixed_now).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_day_offset() {
        let parsed = parse_time_value("-7d", fixed_now).unwrap();
        assert_eq!(parsed, fixed_now() - Duration::days(7));
    }

    #[test]
    fn parses_month_offset() {
        let parsed = parse_time_value("1mo", fixed_now).unwrap();
        assert_eq!(parsed.month(), 4);
        assert_eq!(parsed.year(), 2026);
    }

    #[test]
    fn parses_year_offset() {
        let parsed = parse_time_value("-1y", fixed_now).unwrap();
        assert_eq!(parsed.year(), 2025);
    }

    #[test]
    fn parses_humantime_duration_as_from_now() {
        let parsed = parse_time_value("1h", fixed_now).unwrap();
        assert_eq!(parsed, fixed_now() + Duration::hours(1));
    }

    #[test]
    fn parses_humantime_duration_with_leading_plus() {
        let parsed = parse_time_value("+1h", fixed_now).unwrap();
        assert_eq!(parsed, fixed_now() + Duration::hours(1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_time_value("not-a-time", fixed_now).is_err());
    }
}

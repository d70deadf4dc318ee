//! Precision and calendar truncation policy shared by every transform.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Timelike, Utc};
use mask_core::TruncateUnit;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to `digits` places after the decimal point, half away from zero.
pub fn round_decimal(value: Decimal, digits: u32) -> Decimal {
    value.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to `digits` places after the decimal point, half away from zero.
///
/// Values whose scaled form is not finite are returned unchanged.
pub fn round_float(value: f64, digits: u32) -> f64 {
    scaled(value, digits, f64::round)
}

/// Largest value with `digits` places that is `<= value`.
pub(crate) fn floor_float(value: f64, digits: u32) -> f64 {
    scaled(value, digits, f64::floor)
}

/// Smallest value with `digits` places that is `>= value`.
pub(crate) fn ceil_float(value: f64, digits: u32) -> f64 {
    scaled(value, digits, f64::ceil)
}

fn scaled(value: f64, digits: u32, op: fn(f64) -> f64) -> f64 {
    let factor = 10f64.powi(digits.min(308) as i32);
    let up = value * factor;
    if !up.is_finite() || !factor.is_finite() {
        return value;
    }
    op(up) / factor
}

/// Zero every component of `t` finer than `unit`.
pub fn truncate_timestamp(t: DateTime<Utc>, unit: TruncateUnit) -> DateTime<Utc> {
    let (year, month, day) = (t.year(), t.month(), t.day());
    let (hour, minute, second, nano) = (t.hour(), t.minute(), t.second(), t.nanosecond());

    let naive = match unit {
        TruncateUnit::Year => NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        TruncateUnit::Month => {
            NaiveDate::from_ymd_opt(year, month, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        TruncateUnit::Day => {
            NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        TruncateUnit::Hour => t.date_naive().and_hms_opt(hour, 0, 0),
        TruncateUnit::Minute => t.date_naive().and_hms_opt(hour, minute, 0),
        TruncateUnit::Second => t.date_naive().and_hms_opt(hour, minute, second),
        TruncateUnit::Millisecond => {
            t.date_naive()
                .and_hms_nano_opt(hour, minute, second, nano - nano % 1_000_000)
        }
        TruncateUnit::Microsecond => {
            t.date_naive()
                .and_hms_nano_opt(hour, minute, second, nano - nano % 1_000)
        }
        TruncateUnit::Nanosecond => return t,
    };
    naive.map(|n| n.and_utc()).unwrap_or(t)
}

/// The first `unit` boundary strictly after the truncation of `t`.
pub(crate) fn next_boundary(t: DateTime<Utc>, unit: TruncateUnit) -> Option<DateTime<Utc>> {
    let floor = truncate_timestamp(t, unit);
    match unit {
        TruncateUnit::Year => floor.checked_add_months(Months::new(12)),
        TruncateUnit::Month => floor.checked_add_months(Months::new(1)),
        TruncateUnit::Day => floor.checked_add_signed(TimeDelta::try_days(1)?),
        TruncateUnit::Hour => floor.checked_add_signed(TimeDelta::try_hours(1)?),
        TruncateUnit::Minute => floor.checked_add_signed(TimeDelta::try_minutes(1)?),
        TruncateUnit::Second => floor.checked_add_signed(TimeDelta::try_seconds(1)?),
        TruncateUnit::Millisecond => floor.checked_add_signed(TimeDelta::try_milliseconds(1)?),
        TruncateUnit::Microsecond => floor.checked_add_signed(TimeDelta::microseconds(1)),
        TruncateUnit::Nanosecond => floor.checked_add_signed(TimeDelta::nanoseconds(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 7, 19, 14, 37, 52).unwrap() + TimeDelta::nanoseconds(123_456_789)
    }

    #[test]
    fn test_truncate_each_unit() {
        let t = sample();
        let cases = [
            (TruncateUnit::Year, "2023-01-01T00:00:00Z"),
            (TruncateUnit::Month, "2023-07-01T00:00:00Z"),
            (TruncateUnit::Day, "2023-07-19T00:00:00Z"),
            (TruncateUnit::Hour, "2023-07-19T14:00:00Z"),
            (TruncateUnit::Minute, "2023-07-19T14:37:00Z"),
            (TruncateUnit::Second, "2023-07-19T14:37:52Z"),
            (TruncateUnit::Millisecond, "2023-07-19T14:37:52.123Z"),
            (TruncateUnit::Microsecond, "2023-07-19T14:37:52.123456Z"),
            (TruncateUnit::Nanosecond, "2023-07-19T14:37:52.123456789Z"),
        ];
        for (unit, expected) in cases {
            let expected = DateTime::parse_from_rfc3339(expected).unwrap().with_timezone(&Utc);
            assert_eq!(truncate_timestamp(t, unit), expected, "unit {unit}");
        }
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let t = sample();
        for unit in [TruncateUnit::Month, TruncateUnit::Hour, TruncateUnit::Millisecond] {
            let once = truncate_timestamp(t, unit);
            assert_eq!(truncate_timestamp(once, unit), once);
        }
    }

    #[test]
    fn test_next_boundary() {
        let t = sample();
        assert_eq!(
            next_boundary(t, TruncateUnit::Month),
            Some(Utc.with_ymd_and_hms(2023, 8, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            next_boundary(t, TruncateUnit::Year),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            next_boundary(t, TruncateUnit::Minute),
            Some(Utc.with_ymd_and_hms(2023, 7, 19, 14, 38, 0).unwrap())
        );
    }

    #[test]
    fn test_round_decimal_half_away_from_zero() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(round_decimal(d("2.5"), 0), d("3"));
        assert_eq!(round_decimal(d("-2.5"), 0), d("-3"));
        assert_eq!(round_decimal(d("1.2345"), 2), d("1.23"));
        assert_eq!(round_decimal(d("1.235"), 2), d("1.24"));
        assert_eq!(round_decimal(d("7"), 3), d("7"));
        assert!(round_decimal(d("3.14159"), 3).scale() <= 3);
    }

    #[test]
    fn test_round_float() {
        assert_eq!(round_float(2.5, 0), 3.0);
        assert_eq!(round_float(-2.5, 0), -3.0);
        assert_eq!(round_float(138.46, 0), 138.0);
        assert_eq!(round_float(1.23456, 2), 1.23);
        assert_eq!(round_float(f64::MAX, 2), f64::MAX);
        assert_eq!(floor_float(1.29, 1), 1.2);
        assert_eq!(ceil_float(1.21, 1), 1.3);
    }

    #[test]
    fn test_round_float_digit_count() {
        for digits in 0..6u32 {
            let rounded = round_float(123.456789, digits);
            let text = rounded.to_string();
            let fraction_len = text.split('.').nth(1).map(str::len).unwrap_or(0);
            assert!(fraction_len <= digits as usize, "{text} has more than {digits} digits");
        }
    }
}

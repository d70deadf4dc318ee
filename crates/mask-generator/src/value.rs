//! Arithmetic capabilities of each value kind.
//!
//! The uniform and noise algorithms are written once against
//! [`DomainValue`], [`Offset`] and [`Proportional`]. Each kind supplies its
//! own default bounds, a mapping from generator bytes into `[min, max]`, and
//! its precision policy: decimal places for floats and decimals, a calendar
//! unit for timestamps, nothing for integers.

use crate::error::SetupError;
use crate::truncate::{ceil_float, floor_float, next_boundary, round_decimal, round_float, truncate_timestamp};
use chrono::{DateTime, TimeDelta, Utc};
use mask_core::{ColumnClass, ColumnValue, TruncateUnit, ValueKind};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Largest digit count a decimal domain can hold.
pub const MAX_DECIMAL_DIGITS: usize = 28;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// A value kind the engine can bound, draw and round.
pub trait DomainValue:
    Copy + PartialOrd + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Precision setting carried by limiters of this kind.
    type Precision: Copy + PartialEq + fmt::Debug + Send + Sync + 'static;

    const KIND: ValueKind;

    /// Absolute bounds for a storage size hint.
    fn default_bounds(size_hint: usize) -> Result<(Self, Self), SetupError>;

    /// Generator bytes needed to draw uniformly from `[min, max]`.
    fn draw_len(min: Self, max: Self, precision: Option<Self::Precision>) -> usize;

    /// Map generator bytes onto `[min, max]`.
    fn from_draw(bytes: &[u8], min: Self, max: Self, precision: Option<Self::Precision>) -> Self;

    /// Clamp into `[min, max]` and apply the precision policy without leaving the range.
    fn fit(self, min: Self, max: Self, precision: Option<Self::Precision>) -> Self;

    /// Whether a column of `class` can supply bounds of this kind.
    fn accepts(class: ColumnClass) -> bool;

    /// Read a cell value as this kind.
    fn from_column_value(value: &ColumnValue) -> Option<Self>;

    fn into_column_value(self) -> ColumnValue;
}

/// Kinds that can be shifted by a non-negative delta, saturating at the kind's limits.
pub trait Offset: DomainValue {
    type Delta: Copy + fmt::Debug;

    fn offset(self, delta: Self::Delta, negative: bool) -> Self;
}

/// Kinds where a delta can be a fraction of the value's magnitude.
pub trait Proportional: Offset {
    /// `|self| * ratio`
    fn proportion(self, ratio: f64) -> Self::Delta;
}

pub(crate) fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Bytes for a uniform draw over `span + 1` values, plus one extra byte to
/// keep the modulo bias low.
pub(crate) fn span_draw_len(span: u128) -> usize {
    let bits = 128 - span.leading_zeros() as usize;
    (bits.div_ceil(8) + 1).min(16)
}

/// Big-endian integer from the trailing (at most 16) bytes.
pub(crate) fn draw_u128(bytes: &[u8]) -> u128 {
    let start = bytes.len().saturating_sub(16);
    bytes[start..]
        .iter()
        .fold(0u128, |acc, b| (acc << 8) | u128::from(*b))
}

/// Offset in `[0, span]`.
pub(crate) fn pick(bytes: &[u8], span: u128) -> u128 {
    let u = draw_u128(bytes);
    match span.checked_add(1) {
        Some(modulus) => u % modulus,
        None => u,
    }
}

/// Fraction in `[0, 1)` from the first eight bytes.
pub(crate) fn unit_fraction(bytes: &[u8]) -> f64 {
    let mut word = [0u8; 8];
    let n = bytes.len().min(8);
    word[..n].copy_from_slice(&bytes[..n]);
    (u64::from_be_bytes(word) >> 11) as f64 / (1u64 << 53) as f64
}

// ============================================================================
// Int
// ============================================================================

impl DomainValue for i64 {
    type Precision = ();

    const KIND: ValueKind = ValueKind::Int;

    fn default_bounds(size_hint: usize) -> Result<(Self, Self), SetupError> {
        match size_hint {
            2 => Ok((i16::MIN.into(), i16::MAX.into())),
            4 => Ok((i32::MIN.into(), i32::MAX.into())),
            8 => Ok((i64::MIN, i64::MAX)),
            size => Err(SetupError::UnsupportedSize {
                kind: Self::KIND,
                size,
            }),
        }
    }

    fn draw_len(min: Self, max: Self, _precision: Option<()>) -> usize {
        span_draw_len(int_span(min, max))
    }

    fn from_draw(bytes: &[u8], min: Self, max: Self, _precision: Option<()>) -> Self {
        let value = i128::from(min) + pick(bytes, int_span(min, max)) as i128;
        i64::try_from(value).unwrap_or(max)
    }

    fn fit(self, min: Self, max: Self, _precision: Option<()>) -> Self {
        clamp(self, min, max)
    }

    fn accepts(class: ColumnClass) -> bool {
        class == ColumnClass::Int
    }

    fn from_column_value(value: &ColumnValue) -> Option<Self> {
        value.as_i64()
    }

    fn into_column_value(self) -> ColumnValue {
        ColumnValue::Int(self)
    }
}

fn int_span(min: i64, max: i64) -> u128 {
    (i128::from(max) - i128::from(min)).max(0) as u128
}

impl Offset for i64 {
    type Delta = i128;

    fn offset(self, delta: i128, negative: bool) -> Self {
        let shifted = if negative {
            i128::from(self).saturating_sub(delta)
        } else {
            i128::from(self).saturating_add(delta)
        };
        clamp(shifted, i64::MIN.into(), i64::MAX.into()) as i64
    }
}

impl Proportional for i64 {
    /// Capped at the width of the i64 range.
    fn proportion(self, ratio: f64) -> i128 {
        let delta = (self.unsigned_abs() as f64 * ratio) as i128;
        delta.min(i128::from(u64::MAX))
    }
}

// ============================================================================
// Float
// ============================================================================

impl DomainValue for f64 {
    /// Digits after the decimal point
    type Precision = u32;

    const KIND: ValueKind = ValueKind::Float;

    fn default_bounds(size_hint: usize) -> Result<(Self, Self), SetupError> {
        match size_hint {
            4 => Ok((f64::from(-f32::MAX), f64::from(f32::MAX))),
            8 => Ok((-f64::MAX, f64::MAX)),
            size => Err(SetupError::UnsupportedSize {
                kind: Self::KIND,
                size,
            }),
        }
    }

    fn draw_len(_min: Self, _max: Self, _precision: Option<u32>) -> usize {
        8
    }

    fn from_draw(bytes: &[u8], min: Self, max: Self, _precision: Option<u32>) -> Self {
        let frac = unit_fraction(bytes);
        let width = max - min;
        let value = if width.is_finite() {
            min + frac * width
        } else {
            min * (1.0 - frac) + max * frac
        };
        clamp(value, min, max)
    }

    /// NaN saturates to `min`.
    fn fit(self, min: Self, max: Self, precision: Option<u32>) -> Self {
        let clamped = if self.is_nan() {
            min
        } else {
            clamp(self, min, max)
        };
        let Some(digits) = precision else {
            return clamped;
        };
        let rounded = round_float(clamped, digits);
        if rounded > max {
            let down = floor_float(max, digits);
            if down >= min {
                return down;
            }
            clamped
        } else if rounded < min {
            let up = ceil_float(min, digits);
            if up <= max {
                return up;
            }
            clamped
        } else {
            rounded
        }
    }

    fn accepts(class: ColumnClass) -> bool {
        matches!(class, ColumnClass::Int | ColumnClass::Float)
    }

    /// NaN has no place in a bounded range and is rejected.
    fn from_column_value(value: &ColumnValue) -> Option<Self> {
        value.as_f64().filter(|v| !v.is_nan())
    }

    fn into_column_value(self) -> ColumnValue {
        ColumnValue::Float(self)
    }
}

impl Offset for f64 {
    type Delta = f64;

    fn offset(self, delta: f64, negative: bool) -> Self {
        let shifted = if negative { self - delta } else { self + delta };
        clamp(shifted, -f64::MAX, f64::MAX)
    }
}

impl Proportional for f64 {
    fn proportion(self, ratio: f64) -> f64 {
        self.abs() * ratio
    }
}

// ============================================================================
// Decimal
// ============================================================================

/// Integer count of `10^-scale` units in `value`, rounded with `strategy`.
fn decimal_units(value: Decimal, scale: u32, strategy: RoundingStrategy) -> Option<i128> {
    let mut rounded = value.round_dp_with_strategy(scale, strategy);
    rounded.rescale(scale);
    (rounded.scale() == scale).then(|| rounded.mantissa())
}

/// Unit grid for `[min, max]`: the largest scale `<= precision` at which both
/// bounds are representable, and the first and last grid points inside the range.
fn decimal_grid(min: Decimal, max: Decimal, precision: Option<u32>) -> Option<(u32, i128, i128)> {
    let requested = precision.unwrap_or_else(|| min.scale().max(max.scale()));
    (0..=requested.min(MAX_DECIMAL_DIGITS as u32)).rev().find_map(|scale| {
        let lo = decimal_units(min, scale, RoundingStrategy::ToPositiveInfinity)?;
        let hi = decimal_units(max, scale, RoundingStrategy::ToNegativeInfinity)?;
        (lo <= hi).then_some((scale, lo, hi))
    })
}

impl DomainValue for Decimal {
    /// Digits after the decimal point
    type Precision = u32;

    const KIND: ValueKind = ValueKind::Decimal;

    fn default_bounds(size_hint: usize) -> Result<(Self, Self), SetupError> {
        if size_hint == 0 || size_hint > MAX_DECIMAL_DIGITS {
            return Err(SetupError::UnsupportedSize {
                kind: Self::KIND,
                size: size_hint,
            });
        }
        let max = Decimal::from_i128_with_scale(10i128.pow(size_hint as u32) - 1, 0);
        Ok((-max, max))
    }

    fn draw_len(min: Self, max: Self, precision: Option<u32>) -> usize {
        match decimal_grid(min, max, precision) {
            Some((_, lo, hi)) => span_draw_len((hi - lo) as u128),
            None => 1,
        }
    }

    fn from_draw(bytes: &[u8], min: Self, max: Self, precision: Option<u32>) -> Self {
        let Some((scale, lo, hi)) = decimal_grid(min, max, precision) else {
            return min;
        };
        let units = lo + pick(bytes, (hi - lo) as u128) as i128;
        Decimal::try_from_i128_with_scale(units, scale).unwrap_or(min)
    }

    fn fit(self, min: Self, max: Self, precision: Option<u32>) -> Self {
        let clamped = clamp(self, min, max);
        let Some(digits) = precision else {
            return clamped;
        };
        let rounded = round_decimal(clamped, digits);
        if rounded > max {
            let down = max.round_dp_with_strategy(digits, RoundingStrategy::ToNegativeInfinity);
            if down >= min {
                return down;
            }
            clamped
        } else if rounded < min {
            let up = min.round_dp_with_strategy(digits, RoundingStrategy::ToPositiveInfinity);
            if up <= max {
                return up;
            }
            clamped
        } else {
            rounded
        }
    }

    fn accepts(class: ColumnClass) -> bool {
        class.is_numeric()
    }

    fn from_column_value(value: &ColumnValue) -> Option<Self> {
        match value {
            ColumnValue::Float(f) => Decimal::from_f64(*f),
            other => other.as_decimal(),
        }
    }

    fn into_column_value(self) -> ColumnValue {
        ColumnValue::Decimal(self)
    }
}

impl Offset for Decimal {
    type Delta = Decimal;

    fn offset(self, delta: Decimal, negative: bool) -> Self {
        if negative {
            self.saturating_sub(delta)
        } else {
            self.saturating_add(delta)
        }
    }
}

impl Proportional for Decimal {
    fn proportion(self, ratio: f64) -> Decimal {
        let ratio = Decimal::from_f64(ratio).unwrap_or(Decimal::MAX);
        self.abs().saturating_mul(ratio)
    }
}

// ============================================================================
// Timestamp
// ============================================================================

fn timestamp_nanos(t: DateTime<Utc>) -> i128 {
    i128::from(t.timestamp()) * NANOS_PER_SECOND + i128::from(t.timestamp_subsec_nanos())
}

fn timestamp_from_nanos(nanos: i128) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).ok()?;
    let subsec = nanos.rem_euclid(NANOS_PER_SECOND) as u32;
    DateTime::from_timestamp(secs, subsec)
}

fn timestamp_span(min: DateTime<Utc>, max: DateTime<Utc>) -> u128 {
    (timestamp_nanos(max) - timestamp_nanos(min)).max(0) as u128
}

/// 0001-01-01T00:00:00Z
const TIMESTAMP_MIN_SECS: i64 = -62_135_596_800;
/// 9999-12-31T23:59:59Z
const TIMESTAMP_MAX_SECS: i64 = 253_402_300_799;

impl DomainValue for DateTime<Utc> {
    /// Calendar truncation unit
    type Precision = TruncateUnit;

    const KIND: ValueKind = ValueKind::Timestamp;

    fn default_bounds(_size_hint: usize) -> Result<(Self, Self), SetupError> {
        let min = DateTime::from_timestamp(TIMESTAMP_MIN_SECS, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let max = DateTime::from_timestamp(TIMESTAMP_MAX_SECS, 999_999_999)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Ok((min, max))
    }

    fn draw_len(min: Self, max: Self, _precision: Option<TruncateUnit>) -> usize {
        span_draw_len(timestamp_span(min, max))
    }

    fn from_draw(bytes: &[u8], min: Self, max: Self, _precision: Option<TruncateUnit>) -> Self {
        let nanos = timestamp_nanos(min) + pick(bytes, timestamp_span(min, max)) as i128;
        timestamp_from_nanos(nanos).unwrap_or(min)
    }

    fn fit(self, min: Self, max: Self, precision: Option<TruncateUnit>) -> Self {
        let clamped = clamp(self, min, max);
        let Some(unit) = precision else {
            return clamped;
        };
        let truncated = truncate_timestamp(clamped, unit);
        if truncated >= min {
            return truncated;
        }
        match next_boundary(truncated, unit) {
            Some(next) if next <= max => next,
            _ => clamped,
        }
    }

    fn accepts(class: ColumnClass) -> bool {
        class.is_temporal()
    }

    fn from_column_value(value: &ColumnValue) -> Option<Self> {
        value.as_timestamp()
    }

    fn into_column_value(self) -> ColumnValue {
        ColumnValue::Timestamp(self)
    }
}

impl Offset for DateTime<Utc> {
    type Delta = TimeDelta;

    fn offset(self, delta: TimeDelta, negative: bool) -> Self {
        if negative {
            self.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
        } else {
            self.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_int_default_bounds() {
        assert_eq!(i64::default_bounds(2).unwrap(), (-32768, 32767));
        assert_eq!(i64::default_bounds(4).unwrap(), (i32::MIN as i64, i32::MAX as i64));
        assert_eq!(i64::default_bounds(8).unwrap(), (i64::MIN, i64::MAX));
        assert!(matches!(
            i64::default_bounds(3),
            Err(SetupError::UnsupportedSize { size: 3, .. })
        ));
    }

    #[test]
    fn test_float_and_decimal_default_bounds() {
        assert_eq!(f64::default_bounds(8).unwrap(), (-f64::MAX, f64::MAX));
        assert_eq!(f64::default_bounds(4).unwrap().1, f32::MAX as f64);
        assert!(f64::default_bounds(2).is_err());

        assert_eq!(Decimal::default_bounds(3).unwrap(), (dec("-999"), dec("999")));
        assert!(Decimal::default_bounds(0).is_err());
        assert!(Decimal::default_bounds(29).is_err());
        assert!(Decimal::default_bounds(28).is_ok());
    }

    #[test]
    fn test_timestamp_default_bounds() {
        let (min, max) = DateTime::<Utc>::default_bounds(0).unwrap();
        assert_eq!(min, Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            max.date_naive(),
            chrono::NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_span_draw_len_adds_extra_byte() {
        assert_eq!(span_draw_len(0), 1);
        assert_eq!(span_draw_len(99), 2);
        assert_eq!(span_draw_len(255), 2);
        assert_eq!(span_draw_len(256), 3);
        assert_eq!(span_draw_len(u64::MAX as u128), 9);
        assert_eq!(span_draw_len(u128::MAX), 16);
    }

    #[test]
    fn test_int_from_draw_full_range() {
        let bytes = [0xFFu8; 9];
        let v = i64::from_draw(&bytes, i64::MIN, i64::MAX, None);
        assert!((i64::MIN..=i64::MAX).contains(&v));

        let zero = [0u8; 9];
        assert_eq!(i64::from_draw(&zero, i64::MIN, i64::MAX, None), i64::MIN);
        assert_eq!(i64::from_draw(&zero, 5, 5, None), 5);
    }

    #[test]
    fn test_int_offset_saturates() {
        assert_eq!(i64::MAX.offset(10, false), i64::MAX);
        assert_eq!(i64::MIN.offset(10, true), i64::MIN);
        assert_eq!(100i64.offset(100i64.proportion(0.5), true), 50);
        assert_eq!(i64::MIN.proportion(0.0), 0);

        let huge = 4_000_000_000_000_000_000i64.proportion(1e30);
        assert_eq!(huge, i128::from(u64::MAX));
        assert_eq!(i64::MIN.offset(huge, false), i64::MAX);
        assert_eq!(i64::MAX.offset(huge, true), i64::MIN);
        assert_eq!(0i64.offset(i128::MAX, false), i64::MAX);
        assert_eq!(0i64.offset(i128::MAX, true), i64::MIN);
    }

    #[test]
    fn test_float_from_draw_wide_range_is_finite() {
        for seed in 0u8..=255 {
            let bytes = [seed; 8];
            let v = f64::from_draw(&bytes, -f64::MAX, f64::MAX, None);
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_float_fit_keeps_range_over_precision() {
        // Rounding 0.16 to one digit would leave [0.11, 0.19]
        assert_eq!(0.16f64.fit(0.11, 0.19, Some(1)), 0.16);
        assert_eq!(0.19f64.fit(0.11, 0.25, Some(1)), 0.2);
        assert_eq!(0.249f64.fit(0.11, 0.249, Some(1)), 0.2);
        assert_eq!(500.0f64.fit(90.0, 110.0, Some(0)), 110.0);
        assert_eq!(f64::NAN.fit(-10.0, 10.0, Some(2)), -10.0);
        assert_eq!(f64::NAN.fit(0.11, 0.19, Some(1)), 0.11);
    }

    #[test]
    fn test_decimal_from_draw_respects_precision_and_range() {
        let (min, max) = (dec("-10.005"), dec("10.005"));
        for seed in 0u8..=255 {
            let bytes = [seed, seed.wrapping_mul(7), seed.wrapping_add(3)];
            let v = Decimal::from_draw(&bytes, min, max, Some(2));
            assert!(v >= min && v <= max, "{v} out of range");
            assert!(v.scale() <= 2);
        }
    }

    #[test]
    fn test_decimal_grid_without_representable_point() {
        // No integer lies in [0.2, 0.8]
        assert_eq!(decimal_grid(dec("0.2"), dec("0.8"), Some(0)), None);
        assert_eq!(Decimal::from_draw(&[7], dec("0.2"), dec("0.8"), Some(0)), dec("0.2"));
    }

    #[test]
    fn test_decimal_wide_domain() {
        let (min, max) = Decimal::default_bounds(28).unwrap();
        let len = Decimal::draw_len(min, max, Some(4));
        let bytes = vec![0xAB; len];
        let v = Decimal::from_draw(&bytes, min, max, Some(4));
        assert!(v >= min && v <= max);
    }

    #[test]
    fn test_decimal_offset_saturates() {
        assert_eq!(Decimal::MAX.offset(dec("1"), false), Decimal::MAX);
        assert_eq!(dec("100").offset(dec("100").proportion(0.25), false), dec("125"));
    }

    #[test]
    fn test_timestamp_roundtrip_nanos() {
        let t = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap() + TimeDelta::nanoseconds(5);
        assert_eq!(timestamp_from_nanos(timestamp_nanos(t)), Some(t));
    }

    #[test]
    fn test_timestamp_fit_truncates_inside_range() {
        let min = Utc.with_ymd_and_hms(2020, 1, 15, 0, 0, 0).unwrap();
        let max = Utc.with_ymd_and_hms(2020, 3, 20, 0, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2020, 1, 20, 10, 0, 0).unwrap();

        // The January boundary precedes min, February 1st is the first one inside
        assert_eq!(
            early.fit(min, max, Some(TruncateUnit::Month)),
            Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap()
        );

        let narrow_max = Utc.with_ymd_and_hms(2020, 1, 25, 0, 0, 0).unwrap();
        assert_eq!(early.fit(min, narrow_max, Some(TruncateUnit::Month)), early);
    }

    #[test]
    fn test_column_value_conversions() {
        assert_eq!(f64::from_column_value(&ColumnValue::Int(3)), Some(3.0));
        assert_eq!(f64::from_column_value(&ColumnValue::Float(f64::NAN)), None);
        assert_eq!(
            f64::from_column_value(&ColumnValue::Float(f64::INFINITY)),
            Some(f64::INFINITY)
        );
        assert_eq!(i64::from_column_value(&ColumnValue::Float(3.0)), None);
        assert_eq!(
            Decimal::from_column_value(&ColumnValue::Float(2.5)),
            Some(dec("2.5"))
        );
        assert!(Decimal::accepts(ColumnClass::Float));
        assert!(!i64::accepts(ColumnClass::Float));
        assert!(DateTime::<Utc>::accepts(ColumnClass::Date));
        assert!(!DateTime::<Utc>::accepts(ColumnClass::Int));
    }

    #[test]
    fn test_unit_fraction_bounds() {
        assert_eq!(unit_fraction(&[0u8; 8]), 0.0);
        assert!(unit_fraction(&[0xFFu8; 8]) < 1.0);
    }
}

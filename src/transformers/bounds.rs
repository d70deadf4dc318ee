//! Threshold literals, sibling references and noise windows from configuration.

use crate::config::parse_duration;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use mask_core::{BoundConfig, RatioConfig, TableMeta, TransformerConfig};
use mask_generator::{
    BoundSource, BoundedDomain, DomainValue, RatioSpec, SetupError, ShiftSpec, SiblingRef,
    ThresholdResolver, DEFAULT_MAX_RATIO, DEFAULT_MIN_RATIO,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Share of `max_ratio` used when a timestamp `min_ratio` is omitted.
const DEFAULT_MIN_SHIFT_SHARE: i32 = 20;

/// Reading a configured literal as a domain value.
pub(crate) trait ParseBound: DomainValue {
    fn parse_bound(bound: &BoundConfig) -> Option<Self>;
}

impl ParseBound for i64 {
    fn parse_bound(bound: &BoundConfig) -> Option<Self> {
        match bound {
            BoundConfig::Int(i) => Some(*i),
            BoundConfig::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Some(*f as i64),
            BoundConfig::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl ParseBound for f64 {
    fn parse_bound(bound: &BoundConfig) -> Option<Self> {
        let value = match bound {
            BoundConfig::Int(i) => *i as f64,
            BoundConfig::Float(f) => *f,
            BoundConfig::Text(s) => s.trim().parse().ok()?,
            BoundConfig::Column { .. } => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl ParseBound for Decimal {
    fn parse_bound(bound: &BoundConfig) -> Option<Self> {
        match bound {
            BoundConfig::Int(i) => Some(Decimal::from(*i)),
            BoundConfig::Float(f) => Decimal::from_f64(*f),
            BoundConfig::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .ok()
            }
            BoundConfig::Column { .. } => None,
        }
    }
}

impl ParseBound for DateTime<Utc> {
    fn parse_bound(bound: &BoundConfig) -> Option<Self> {
        let BoundConfig::Text(s) = bound else {
            return None;
        };
        let s = s.trim();
        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Some(t.with_timezone(&Utc));
        }
        if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(t.and_utc());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc())
    }
}

fn bound_source<T: ParseBound>(
    table: &TableMeta,
    bound: Option<&BoundConfig>,
    parameter: &'static str,
) -> Result<BoundSource<T>, SetupError> {
    match bound {
        None => Ok(BoundSource::Default),
        Some(BoundConfig::Column { column }) => {
            let sibling = table.column_by_name(column)?;
            Ok(BoundSource::Column(SiblingRef::from(sibling)))
        }
        Some(literal) => T::parse_bound(literal)
            .map(BoundSource::Fixed)
            .ok_or_else(|| SetupError::InvalidParameter {
                parameter,
                reason: format!("cannot read {literal:?} as a {} value", T::KIND),
            }),
    }
}

/// Resolver for the configured `min`/`max` within `domain`.
pub(crate) fn threshold_resolver<T: ParseBound>(
    table: &TableMeta,
    config: &TransformerConfig,
    domain: BoundedDomain<T>,
    precision: Option<T::Precision>,
) -> Result<ThresholdResolver<T>, SetupError> {
    let min = bound_source(table, config.min.as_ref(), "min")?;
    let max = bound_source(table, config.max.as_ref(), "max")?;
    ThresholdResolver::new(domain, min, max, precision)
}

fn fraction(
    ratio: Option<&RatioConfig>,
    parameter: &'static str,
    default: f64,
) -> Result<f64, SetupError> {
    match ratio {
        None => Ok(default),
        Some(ratio) => ratio.as_fraction().ok_or_else(|| SetupError::InvalidParameter {
            parameter,
            reason: "expected a fraction of the original value".to_string(),
        }),
    }
}

/// Noise ratios for numeric transformers, defaulting to `[0.05, 0.2]`.
pub(crate) fn ratio_spec(config: &TransformerConfig) -> Result<RatioSpec, SetupError> {
    let min = fraction(config.min_ratio.as_ref(), "min_ratio", DEFAULT_MIN_RATIO)?;
    let max = fraction(config.max_ratio.as_ref(), "max_ratio", DEFAULT_MAX_RATIO)?;
    RatioSpec::new(min, max)
}

fn shift(ratio: &RatioConfig, parameter: &'static str) -> Result<TimeDelta, SetupError> {
    let invalid = |reason: String| SetupError::InvalidParameter { parameter, reason };
    match ratio {
        RatioConfig::Interval(interval) => interval
            .to_duration()
            .ok_or_else(|| invalid("interval out of range".to_string())),
        RatioConfig::Text(text) => parse_duration(text).map_err(|e| invalid(format!("{e:#}"))),
        RatioConfig::Fraction(_) => Err(invalid("expected an interval".to_string())),
    }
}

/// Timestamp shift window; `max_ratio` is required, `min_ratio` defaults to 5% of it.
pub(crate) fn shift_spec(config: &TransformerConfig) -> Result<ShiftSpec, SetupError> {
    let max = match &config.max_ratio {
        Some(ratio) => shift(ratio, "max_ratio")?,
        None => {
            return Err(SetupError::InvalidParameter {
                parameter: "max_ratio",
                reason: "required for timestamp noise".to_string(),
            })
        }
    };
    let min = match &config.min_ratio {
        Some(ratio) => shift(ratio, "min_ratio")?,
        None => max / DEFAULT_MIN_SHIFT_SHARE,
    };
    ShiftSpec::new(min, max)
}

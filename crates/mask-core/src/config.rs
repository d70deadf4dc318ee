//! Transformer configuration.
//!
//! Configuration arrives already typed: each column transformer is described
//! by a [`TransformerConfig`] and a run is described by a [`MaskingConfig`]
//! holding the salt and the list of transformers.
//!
//! # YAML Format
//!
//! ```yaml
//! salt: "run-secret"
//! transformers:
//!   - transformer: random_int
//!     column: age
//!     engine: deterministic
//!     min: 18
//!     max: 90
//!   - transformer: noise_float
//!     column: salary
//!     min_ratio: 0.1
//!     max_ratio: 0.3
//!     decimal: 2
//!     max:
//!       column: salary_cap
//!   - transformer: noise_date
//!     column: born_at
//!     min_ratio: { days: 1 }
//!     max_ratio: { days: 30 }
//!     truncate: day
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Unknown enumerated value
    #[error("Unknown {parameter} value '{value}'")]
    UnknownValue {
        parameter: &'static str,
        value: String,
    },
}

/// Transformer implementations backed by the bounded value engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformerKind {
    NoiseInt,
    NoiseFloat,
    NoiseNumeric,
    NoiseDate,
    RandomInt,
    RandomFloat,
    RandomNumeric,
    RandomDate,
}

impl TransformerKind {
    /// Name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoiseInt => "noise_int",
            Self::NoiseFloat => "noise_float",
            Self::NoiseNumeric => "noise_numeric",
            Self::NoiseDate => "noise_date",
            Self::RandomInt => "random_int",
            Self::RandomFloat => "random_float",
            Self::RandomNumeric => "random_numeric",
            Self::RandomDate => "random_date",
        }
    }
}

impl fmt::Display for TransformerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value generation engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Fresh entropy on every call
    #[default]
    Random,

    /// Salted hash of the original value
    Deterministic,

    /// Deprecated alias of `Deterministic`
    Hash,
}

impl Engine {
    /// Collapse deprecated aliases.
    pub fn canonical(self) -> Self {
        match self {
            Self::Hash => Self::Deterministic,
            other => other,
        }
    }
}

/// Calendar unit a timestamp is truncated to.
///
/// Ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncateUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TruncateUnit {
    /// Name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
            Self::Microsecond => "microsecond",
            Self::Nanosecond => "nanosecond",
        }
    }
}

impl FromStr for TruncateUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s {
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "hour" => Self::Hour,
            "minute" => Self::Minute,
            "second" => Self::Second,
            "millisecond" => Self::Millisecond,
            "microsecond" => Self::Microsecond,
            "nanosecond" => Self::Nanosecond,
            other => {
                return Err(ConfigError::UnknownValue {
                    parameter: "truncate",
                    value: other.to_string(),
                })
            }
        };
        Ok(unit)
    }
}

impl fmt::Display for TruncateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `min`/`max` threshold: a literal, or a sibling column read per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundConfig {
    /// Read the bound from another column of the same row
    Column { column: String },

    /// Integer literal
    Int(i64),

    /// Floating point literal
    Float(f64),

    /// Textual literal (decimals, timestamps, dates)
    Text(String),
}

impl BoundConfig {
    /// Create a dynamic bound sourced from a sibling column.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column {
            column: name.into(),
        }
    }

    /// Sibling column name, for dynamic bounds.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column { column } => Some(column),
            _ => None,
        }
    }
}

/// Calendar interval used by timestamp noise.
///
/// Years count as 365 days and months as 30 days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub milliseconds: i64,
    pub microseconds: i64,
    pub nanoseconds: i64,
}

impl IntervalConfig {
    /// Total length of the interval, or `None` on overflow.
    pub fn to_duration(&self) -> Option<Duration> {
        let parts = [
            Duration::try_days(self.years.checked_mul(365)?)?,
            Duration::try_days(self.months.checked_mul(30)?)?,
            Duration::try_weeks(self.weeks)?,
            Duration::try_days(self.days)?,
            Duration::try_hours(self.hours)?,
            Duration::try_minutes(self.minutes)?,
            Duration::try_seconds(self.seconds)?,
            Duration::try_milliseconds(self.milliseconds)?,
            Duration::microseconds(self.microseconds),
            Duration::nanoseconds(self.nanoseconds),
        ];
        parts
            .into_iter()
            .try_fold(Duration::zero(), |acc, part| acc.checked_add(&part))
    }
}

/// Noise ratio: a fraction of the original value, or an interval for timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatioConfig {
    /// Fraction of `|original|`
    Fraction(f64),

    /// Absolute shift window
    Interval(IntervalConfig),

    /// Shift written as a duration string such as `"12h"` or `"30d"`
    Text(String),
}

impl RatioConfig {
    /// The fraction, if this is a numeric ratio.
    pub fn as_fraction(&self) -> Option<f64> {
        match self {
            Self::Fraction(f) => Some(*f),
            _ => None,
        }
    }
}

fn default_keep_null() -> bool {
    true
}

/// Configuration of one column transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Transformer implementation
    pub transformer: TransformerKind,

    /// Column to transform
    pub column: String,

    /// Generation engine
    #[serde(default)]
    pub engine: Engine,

    /// Lower threshold
    #[serde(default)]
    pub min: Option<BoundConfig>,

    /// Upper threshold
    #[serde(default)]
    pub max: Option<BoundConfig>,

    /// Lower noise ratio
    #[serde(default)]
    pub min_ratio: Option<RatioConfig>,

    /// Upper noise ratio
    #[serde(default)]
    pub max_ratio: Option<RatioConfig>,

    /// Digits kept after the decimal point
    #[serde(default, alias = "precision")]
    pub decimal: Option<u32>,

    /// Timestamp truncation unit
    #[serde(default)]
    pub truncate: Option<TruncateUnit>,

    /// Storage size fallback when the column length is unknown
    #[serde(default)]
    pub type_size: Option<usize>,

    /// Leave NULL cells untouched
    #[serde(default = "default_keep_null")]
    pub keep_null: bool,
}

impl TransformerConfig {
    /// Create a configuration with defaults for every optional parameter.
    pub fn new(transformer: TransformerKind, column: impl Into<String>) -> Self {
        Self {
            transformer,
            column: column.into(),
            engine: Engine::default(),
            min: None,
            max: None,
            min_ratio: None,
            max_ratio: None,
            decimal: None,
            truncate: None,
            type_size: None,
            keep_null: default_keep_null(),
        }
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_min(mut self, min: BoundConfig) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: BoundConfig) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_ratio(mut self, min: RatioConfig, max: RatioConfig) -> Self {
        self.min_ratio = Some(min);
        self.max_ratio = Some(max);
        self
    }

    pub fn with_decimal(mut self, decimal: u32) -> Self {
        self.decimal = Some(decimal);
        self
    }

    pub fn with_truncate(mut self, unit: TruncateUnit) -> Self {
        self.truncate = Some(unit);
        self
    }

    pub fn with_type_size(mut self, size: usize) -> Self {
        self.type_size = Some(size);
        self
    }

    pub fn with_keep_null(mut self, keep_null: bool) -> Self {
        self.keep_null = keep_null;
        self
    }

    /// Whether any threshold is read from a sibling column.
    pub fn is_dynamic(&self) -> bool {
        [&self.min, &self.max]
            .into_iter()
            .flatten()
            .any(|b| b.column_name().is_some())
    }
}

/// Configuration of a masking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Salt mixed into every deterministic hash
    #[serde(default)]
    pub salt: Option<String>,

    /// Column transformers
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
}

impl MaskingConfig {
    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Salt bytes (empty when not configured).
    pub fn salt_bytes(&self) -> &[u8] {
        self.salt.as_deref().map(str::as_bytes).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_CONFIG: &str = r#"
salt: "s3cret"
transformers:
  - transformer: random_int
    column: age
    engine: deterministic
    min: 18
    max: 90
  - transformer: noise_numeric
    column: amount
    min_ratio: 0.2
    max_ratio: 0.9
    precision: 2
    min: "-100.50"
    max:
      column: amount_cap
  - transformer: noise_date
    column: born_at
    engine: hash
    min_ratio: { days: 1 }
    max_ratio: { weeks: 2, hours: 12 }
    truncate: month
    keep_null: false
"#;

    #[test]
    fn test_parse_masking_config() {
        let config = MaskingConfig::from_yaml(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.salt_bytes(), b"s3cret");
        assert_eq!(config.transformers.len(), 3);

        let age = &config.transformers[0];
        assert_eq!(age.transformer, TransformerKind::RandomInt);
        assert_eq!(age.engine, Engine::Deterministic);
        assert_eq!(age.min, Some(BoundConfig::Int(18)));
        assert!(age.keep_null);
        assert!(!age.is_dynamic());

        let amount = &config.transformers[1];
        assert_eq!(amount.decimal, Some(2));
        assert_eq!(amount.min, Some(BoundConfig::Text("-100.50".to_string())));
        assert_eq!(amount.max, Some(BoundConfig::column("amount_cap")));
        assert_eq!(amount.min_ratio, Some(RatioConfig::Fraction(0.2)));
        assert!(amount.is_dynamic());

        let born = &config.transformers[2];
        assert_eq!(born.engine.canonical(), Engine::Deterministic);
        assert_eq!(born.truncate, Some(TruncateUnit::Month));
        assert!(!born.keep_null);
        let Some(RatioConfig::Interval(max_shift)) = &born.max_ratio else {
            panic!("expected interval, got {:?}", born.max_ratio);
        };
        assert_eq!(
            max_shift.to_duration(),
            Some(Duration::days(14) + Duration::hours(12))
        );
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_CONFIG.as_bytes()).unwrap();

        let config = MaskingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.transformers[0].column, "age");
    }

    #[test]
    fn test_unknown_transformer_is_rejected() {
        let yaml = r#"
transformers:
  - transformer: random_person
    column: name
"#;
        assert!(matches!(
            MaskingConfig::from_yaml(yaml),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_truncate_unit_from_str() {
        assert_eq!("hour".parse::<TruncateUnit>().unwrap(), TruncateUnit::Hour);
        assert!(TruncateUnit::Year < TruncateUnit::Nanosecond);
        assert!(matches!(
            "fortnight".parse::<TruncateUnit>(),
            Err(ConfigError::UnknownValue { .. })
        ));
    }

    #[test]
    fn test_ratio_forms() {
        let yaml = r#"
transformer: noise_date
column: born_at
min_ratio: "12h"
max_ratio: { days: 3 }
"#;
        let config: TransformerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.min_ratio, Some(RatioConfig::Text("12h".to_string())));
        assert_eq!(config.min_ratio.as_ref().unwrap().as_fraction(), None);
        assert!(matches!(config.max_ratio, Some(RatioConfig::Interval(_))));
    }

    #[test]
    fn test_interval_conversion() {
        let interval = IntervalConfig {
            years: 1,
            months: 1,
            ..Default::default()
        };
        assert_eq!(interval.to_duration(), Some(Duration::days(395)));
        assert_eq!(IntervalConfig::default().to_duration(), Some(Duration::zero()));

        let huge = IntervalConfig {
            years: i64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.to_duration(), None);
    }
}

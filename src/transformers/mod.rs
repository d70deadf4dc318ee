//! Numeric and temporal column transformers.
//!
//! Each transformer owns one domain, one threshold resolver, one byte
//! generator and its scratch buffers, so an instance must be driven by a
//! single worker at a time.
//!
//! | transformer      | column classes    | value kind  |
//! |------------------|-------------------|-------------|
//! | `random_int`     | int               | `i64`       |
//! | `noise_int`      | int               | `i64`       |
//! | `random_float`   | float             | `f64`       |
//! | `noise_float`    | float             | `f64`       |
//! | `random_numeric` | decimal           | `Decimal`   |
//! | `noise_numeric`  | decimal           | `Decimal`   |
//! | `random_date`    | date, timestamp   | `DateTime`  |
//! | `noise_date`     | date, timestamp   | `DateTime`  |

mod bounds;
mod noise;
mod random;

pub use noise::NoiseTransformer;
pub use random::RandomTransformer;

use bounds::{ratio_spec, shift_spec, threshold_resolver, ParseBound};
use chrono::{DateTime, Utc};
use mask_core::{
    ColumnClass, ColumnMeta, ColumnValue, Engine, RowAccessor, TableMeta, TransformerConfig,
    TransformerKind, TruncateUnit,
};
use mask_generator::{
    generator_for, BoundedDomain, ByteGenerator, DomainValue, Offset, RowError, Salt, SetupError,
    Spread, ThresholdResolver, MAX_DECIMAL_DIGITS,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Storage size assumed for int columns without a known length.
pub const DEFAULT_INT_SIZE: usize = 4;

/// Storage size assumed for float columns without a known length.
pub const DEFAULT_FLOAT_SIZE: usize = 4;

/// Digits kept by float transformers unless `decimal` is configured.
pub const DEFAULT_FLOAT_DECIMAL: u32 = 4;

/// A configured column transformation.
pub trait Transformer: Send {
    fn kind(&self) -> TransformerKind;

    /// Row position of the column this transformer writes.
    fn affected_column(&self) -> usize;

    /// Transform one row in place.
    ///
    /// An error leaves the row unchanged and does not affect later rows.
    fn transform(&mut self, row: &mut dyn RowAccessor) -> Result<(), RowError>;
}

/// The column a transformer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTarget {
    pub name: String,
    pub idx: usize,
    pub class: ColumnClass,
}

impl ColumnTarget {
    /// Cell value for a generated value, narrowed to the column class.
    pub fn cell<T: DomainValue>(&self, value: T) -> ColumnValue {
        match (value.into_column_value(), self.class) {
            (ColumnValue::Timestamp(t), ColumnClass::Date) => ColumnValue::Date(t.date_naive()),
            (cell, _) => cell,
        }
    }
}

impl From<&ColumnMeta> for ColumnTarget {
    fn from(column: &ColumnMeta) -> Self {
        Self {
            name: column.name.clone(),
            idx: column.idx,
            class: column.class,
        }
    }
}

fn supports(kind: TransformerKind, class: ColumnClass) -> bool {
    match kind {
        TransformerKind::RandomInt | TransformerKind::NoiseInt => class == ColumnClass::Int,
        TransformerKind::RandomFloat | TransformerKind::NoiseFloat => class == ColumnClass::Float,
        TransformerKind::RandomNumeric | TransformerKind::NoiseNumeric => {
            class == ColumnClass::Decimal
        }
        TransformerKind::RandomDate | TransformerKind::NoiseDate => class.is_temporal(),
    }
}

/// Build the transformer described by `config` for a column of `table`.
///
/// All validation happens here: a transformer that builds successfully can
/// only fail per row.
pub fn build_transformer(
    table: &TableMeta,
    config: &TransformerConfig,
    salt: &Salt,
) -> Result<Box<dyn Transformer>, SetupError> {
    let column = table.column_by_name(&config.column)?;
    let kind = config.transformer;
    if !supports(kind, column.class) {
        return Err(SetupError::UnsupportedColumn {
            transformer: kind,
            column: column.name.clone(),
            class: column.class,
        });
    }

    if config.engine == Engine::Hash {
        warn!(
            transformer = %kind,
            column = %column.name,
            "Engine 'hash' is deprecated, use 'deterministic'"
        );
    }
    let generator = generator_for(config.engine, salt)?;
    let setup = Setup {
        table,
        config,
        column,
        generator,
    };

    let transformer = match kind {
        TransformerKind::RandomInt => setup.random(int_domain(column, config)?, None)?,
        TransformerKind::NoiseInt => {
            setup.noise(int_domain(column, config)?, None, ratio_spec(config)?)?
        }
        TransformerKind::RandomFloat => {
            setup.random(float_domain(column, config)?, Some(float_decimal(config)))?
        }
        TransformerKind::NoiseFloat => setup.noise(
            float_domain(column, config)?,
            Some(float_decimal(config)),
            ratio_spec(config)?,
        )?,
        TransformerKind::RandomNumeric => {
            setup.random(decimal_domain(column, config)?, decimal_precision(column, config))?
        }
        TransformerKind::NoiseNumeric => setup.noise(
            decimal_domain(column, config)?,
            decimal_precision(column, config),
            ratio_spec(config)?,
        )?,
        TransformerKind::RandomDate => {
            setup.random(timestamp_domain()?, timestamp_precision(column, config))?
        }
        TransformerKind::NoiseDate => setup.noise(
            timestamp_domain()?,
            timestamp_precision(column, config),
            shift_spec(config)?,
        )?,
    };

    debug!(
        transformer = %kind,
        column = %column.name,
        engine = ?config.engine.canonical(),
        "Built transformer"
    );
    Ok(transformer)
}

struct Setup<'a> {
    table: &'a TableMeta,
    config: &'a TransformerConfig,
    column: &'a ColumnMeta,
    generator: Box<dyn ByteGenerator>,
}

impl Setup<'_> {
    fn resolver<T: ParseBound>(
        &self,
        domain: BoundedDomain<T>,
        precision: Option<T::Precision>,
    ) -> Result<ThresholdResolver<T>, SetupError> {
        let resolver = threshold_resolver(self.table, self.config, domain, precision)?;
        if resolver.is_dynamic() {
            debug!(
                column = %self.column.name,
                "Thresholds read from sibling columns, resolving per row"
            );
        }
        Ok(resolver)
    }

    fn random<T: ParseBound>(
        self,
        domain: BoundedDomain<T>,
        precision: Option<T::Precision>,
    ) -> Result<Box<dyn Transformer>, SetupError> {
        let resolver = self.resolver(domain, precision)?;
        Ok(Box::new(RandomTransformer::new(
            self.config.transformer,
            ColumnTarget::from(self.column),
            resolver,
            self.generator,
            self.config.keep_null,
        )))
    }

    fn noise<T, S>(
        self,
        domain: BoundedDomain<T>,
        precision: Option<T::Precision>,
        spread: S,
    ) -> Result<Box<dyn Transformer>, SetupError>
    where
        T: ParseBound + Offset,
        S: Spread<T> + 'static,
    {
        let resolver = self.resolver(domain, precision)?;
        Ok(Box::new(NoiseTransformer::new(
            self.config.transformer,
            ColumnTarget::from(self.column),
            resolver,
            self.generator,
            spread,
        )))
    }
}

fn storage_size(column: &ColumnMeta, config: &TransformerConfig, default: usize) -> usize {
    if let Some(length) = column.length {
        return length;
    }
    let size = config.type_size.unwrap_or(default);
    info!(
        column = %column.name,
        size,
        "Column storage length unknown, using type_size"
    );
    size
}

fn int_domain(
    column: &ColumnMeta,
    config: &TransformerConfig,
) -> Result<BoundedDomain<i64>, SetupError> {
    BoundedDomain::from_size(storage_size(column, config, DEFAULT_INT_SIZE))
}

fn float_domain(
    column: &ColumnMeta,
    config: &TransformerConfig,
) -> Result<BoundedDomain<f64>, SetupError> {
    BoundedDomain::from_size(storage_size(column, config, DEFAULT_FLOAT_SIZE))
}

fn float_decimal(config: &TransformerConfig) -> u32 {
    config.decimal.unwrap_or(DEFAULT_FLOAT_DECIMAL)
}

/// `±(10^precision − 1) · 10^−scale` when the column declares its precision,
/// otherwise `type_size` (or the widest supported) integral digits.
fn decimal_domain(
    column: &ColumnMeta,
    config: &TransformerConfig,
) -> Result<BoundedDomain<Decimal>, SetupError> {
    if let Some(precision) = column.precision.map(usize::from) {
        if (1..=MAX_DECIMAL_DIGITS).contains(&precision) {
            let scale = u32::from(column.scale.unwrap_or(0)).min(precision as u32);
            let max = Decimal::from_i128_with_scale(10i128.pow(precision as u32) - 1, scale);
            return Ok(BoundedDomain::with_bounds(-max, max)?);
        }
    }
    let digits = config.type_size.unwrap_or(MAX_DECIMAL_DIGITS);
    info!(
        column = %column.name,
        digits,
        "Column precision unknown, using type_size digits"
    );
    BoundedDomain::from_size(digits)
}

fn decimal_precision(column: &ColumnMeta, config: &TransformerConfig) -> Option<u32> {
    config.decimal.or(column.scale.map(u32::from))
}

fn timestamp_domain() -> Result<BoundedDomain<DateTime<Utc>>, SetupError> {
    BoundedDomain::from_size(0)
}

/// Date columns never keep a time of day.
fn timestamp_precision(column: &ColumnMeta, config: &TransformerConfig) -> Option<TruncateUnit> {
    match column.class {
        ColumnClass::Date => Some(
            config
                .truncate
                .map_or(TruncateUnit::Day, |unit| unit.min(TruncateUnit::Day)),
        ),
        _ => config.truncate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mask_core::{BoundConfig, Row};

    fn table() -> TableMeta {
        TableMeta::new(
            "accounts",
            vec![
                ColumnMeta::new("id", ColumnClass::Int),
                ColumnMeta::new("balance", ColumnClass::Decimal).with_precision(6, 2),
                ColumnMeta::new("opened", ColumnClass::Date),
                ColumnMeta::new("note", ColumnClass::Text),
            ],
        )
    }

    #[test]
    fn test_unsupported_column_class() {
        let config = TransformerConfig::new(TransformerKind::NoiseFloat, "id");
        let err = build_transformer(&table(), &config, &Salt::default()).err().unwrap();
        assert!(matches!(
            err,
            SetupError::UnsupportedColumn {
                transformer: TransformerKind::NoiseFloat,
                class: ColumnClass::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_int_type_size_fallback() {
        let config = TransformerConfig::new(TransformerKind::RandomInt, "id")
            .with_type_size(2)
            .with_max(BoundConfig::Int(40_000));
        let err = build_transformer(&table(), &config, &Salt::default()).err().unwrap();
        assert!(matches!(err, SetupError::Domain(_)));

        let unsupported = TransformerConfig::new(TransformerKind::RandomInt, "id").with_type_size(3);
        assert!(matches!(
            build_transformer(&table(), &unsupported, &Salt::default()).err().unwrap(),
            SetupError::UnsupportedSize { size: 3, .. }
        ));
    }

    #[test]
    fn test_decimal_domain_from_precision_and_scale() {
        let column = table().columns[1].clone();
        let config = TransformerConfig::new(TransformerKind::RandomNumeric, "balance");
        let domain = decimal_domain(&column, &config).unwrap();
        assert_eq!(domain.max(), Decimal::new(999_999, 2));
        assert_eq!(domain.min(), Decimal::new(-999_999, 2));
        assert_eq!(decimal_precision(&column, &config), Some(2));
        assert_eq!(decimal_precision(&column, &config.with_decimal(0)), Some(0));
    }

    #[test]
    fn test_date_column_writes_dates() {
        let config = TransformerConfig::new(TransformerKind::RandomDate, "opened")
            .with_engine(Engine::Deterministic)
            .with_min(BoundConfig::Text("2000-01-01".into()))
            .with_max(BoundConfig::Text("2000-12-31".into()));
        let mut transformer = build_transformer(&table(), &config, &Salt::new("s")).unwrap();
        assert_eq!(transformer.affected_column(), 2);
        assert_eq!(transformer.kind(), TransformerKind::RandomDate);

        let opened = chrono::NaiveDate::from_ymd_opt(1999, 3, 4).unwrap();
        let mut row = Row::new(vec![None, None, Some(ColumnValue::Date(opened)), None]);
        transformer.transform(&mut row).unwrap();
        match row.get(2) {
            Some(ColumnValue::Date(d)) => {
                assert!(*d >= chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
                assert!(*d <= chrono::NaiveDate::from_ymd_opt(2000, 12, 31).unwrap());
            }
            other => panic!("expected a date, got {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_precision_for_dates() {
        let date = ColumnMeta::new("d", ColumnClass::Date);
        let ts = ColumnMeta::new("t", ColumnClass::Timestamp);
        let base = TransformerConfig::new(TransformerKind::RandomDate, "d");
        assert_eq!(timestamp_precision(&date, &base), Some(TruncateUnit::Day));
        assert_eq!(timestamp_precision(&ts, &base), None);

        let hourly = base.clone().with_truncate(TruncateUnit::Hour);
        assert_eq!(timestamp_precision(&date, &hourly), Some(TruncateUnit::Day));
        let yearly = base.with_truncate(TruncateUnit::Year);
        assert_eq!(timestamp_precision(&date, &yearly), Some(TruncateUnit::Year));
    }
}

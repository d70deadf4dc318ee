//! Running a set of transformers over rows.

use crate::transformers::{build_transformer, Transformer};
use mask_core::{MaskingConfig, RowAccessor, TableMeta};
use mask_generator::{RowError, Salt, SetupError};
use tracing::info;

/// A row that failed, with the transformer column that rejected it.
#[derive(Debug)]
pub struct RowFailure {
    /// Position of the row in the batch
    pub row: usize,
    /// Column written by the failing transformer
    pub column: usize,
    pub error: RowError,
}

/// Outcome of [`MaskingPipeline::apply_batch`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub transformed: usize,
    pub failures: Vec<RowFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered transformers for one table.
pub struct MaskingPipeline {
    transformers: Vec<Box<dyn Transformer>>,
}

impl MaskingPipeline {
    pub fn new(transformers: Vec<Box<dyn Transformer>>) -> Self {
        Self { transformers }
    }

    /// Build every configured transformer; the first setup error aborts.
    pub fn from_config(table: &TableMeta, config: &MaskingConfig) -> Result<Self, SetupError> {
        let salt = Salt::new(config.salt_bytes());
        let transformers = config
            .transformers
            .iter()
            .map(|t| build_transformer(table, t, &salt))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            table = %table.name,
            transformers = transformers.len(),
            "Masking pipeline ready"
        );
        Ok(Self::new(transformers))
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Apply every transformer to `row` in order, stopping at the first error.
    ///
    /// Cells written before the failing transformer keep their new values.
    pub fn apply(&mut self, row: &mut dyn RowAccessor) -> Result<(), (usize, RowError)> {
        for transformer in &mut self.transformers {
            transformer
                .transform(row)
                .map_err(|e| (transformer.affected_column(), e))?;
        }
        Ok(())
    }

    /// Apply the pipeline to every row; failing rows are reported, not fatal.
    pub fn apply_batch<R: RowAccessor>(&mut self, rows: &mut [R]) -> BatchReport {
        let mut report = BatchReport::default();
        for (idx, row) in rows.iter_mut().enumerate() {
            match self.apply(row) {
                Ok(()) => report.transformed += 1,
                Err((column, error)) => report.failures.push(RowFailure {
                    row: idx,
                    column,
                    error,
                }),
            }
        }
        report
    }
}

//! `noise_*` transformers: perturb the original cell value.

use super::{ColumnTarget, Transformer};
use mask_core::{RowAccessor, TransformerKind};
use mask_generator::{ByteGenerator, NoiseTransform, Offset, RowError, Spread, ThresholdResolver};

/// NULL cells are always left untouched.
pub struct NoiseTransformer<T: Offset, S: Spread<T>> {
    kind: TransformerKind,
    target: ColumnTarget,
    resolver: ThresholdResolver<T>,
    transform: NoiseTransform<T, S>,
    input: Vec<u8>,
}

impl<T: Offset, S: Spread<T>> NoiseTransformer<T, S> {
    pub fn new(
        kind: TransformerKind,
        target: ColumnTarget,
        resolver: ThresholdResolver<T>,
        generator: Box<dyn ByteGenerator>,
        spread: S,
    ) -> Self {
        Self {
            kind,
            target,
            resolver,
            transform: NoiseTransform::new(generator, spread),
            input: Vec::new(),
        }
    }
}

impl<T: Offset, S: Spread<T>> Transformer for NoiseTransformer<T, S> {
    fn kind(&self) -> TransformerKind {
        self.kind
    }

    fn affected_column(&self) -> usize {
        self.target.idx
    }

    fn transform(&mut self, row: &mut dyn RowAccessor) -> Result<(), RowError> {
        let idx = self.target.idx;
        let Some(cell) = row.value(idx)? else {
            return Ok(());
        };
        let original = T::from_column_value(&cell).ok_or(RowError::UnexpectedValue {
            column: idx,
            found: cell.class(),
            kind: T::KIND,
        })?;
        row.raw_bytes(idx, &mut self.input)?;

        let limiter = self.resolver.resolve(&*row)?;
        let value = self.transform.generate(&limiter, original, &self.input)?;
        row.set_value(idx, Some(self.target.cell(value)))?;
        Ok(())
    }
}

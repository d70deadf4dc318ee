//! `random_*` transformers: replace the cell with a uniform draw.

use super::{ColumnTarget, Transformer};
use mask_core::{RowAccessor, TransformerKind};
use mask_generator::{ByteGenerator, DomainValue, RowError, ThresholdResolver, UniformTransform};

pub struct RandomTransformer<T: DomainValue> {
    kind: TransformerKind,
    target: ColumnTarget,
    resolver: ThresholdResolver<T>,
    transform: UniformTransform<T>,
    keep_null: bool,
    input: Vec<u8>,
}

impl<T: DomainValue> RandomTransformer<T> {
    pub fn new(
        kind: TransformerKind,
        target: ColumnTarget,
        resolver: ThresholdResolver<T>,
        generator: Box<dyn ByteGenerator>,
        keep_null: bool,
    ) -> Self {
        Self {
            kind,
            target,
            resolver,
            transform: UniformTransform::new(generator),
            keep_null,
            input: Vec::new(),
        }
    }
}

impl<T: DomainValue> Transformer for RandomTransformer<T> {
    fn kind(&self) -> TransformerKind {
        self.kind
    }

    fn affected_column(&self) -> usize {
        self.target.idx
    }

    fn transform(&mut self, row: &mut dyn RowAccessor) -> Result<(), RowError> {
        // A NULL original hashes as empty input
        let present = row.raw_bytes(self.target.idx, &mut self.input)?;
        if !present && self.keep_null {
            return Ok(());
        }
        let limiter = self.resolver.resolve(&*row)?;
        let value = self.transform.generate(&limiter, &self.input)?;
        row.set_value(self.target.idx, Some(self.target.cell(value)))?;
        Ok(())
    }
}

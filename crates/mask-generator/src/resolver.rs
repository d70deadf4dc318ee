//! Static and per-row threshold resolution.
//!
//! The mode is fixed when the resolver is built:
//!
//! ```text
//! Static:   [setup] --build once--> [ready]          every row reuses one Limiter
//! Dynamic:  [setup] --validate sources--> [per-row]
//!           [per-row] --read siblings--> [revalidate] --ok--> [apply]
//!                                                      \--violation--> RowError
//! ```
//!
//! A dynamic violation fails only the row being resolved; nothing is cached
//! between rows.

use crate::domain::{BoundedDomain, Limiter};
use crate::error::{RowError, SetupError};
use crate::value::DomainValue;
use mask_core::{ColumnClass, ColumnMeta, RowAccessor};

/// Sibling column feeding a dynamic bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingRef {
    pub name: String,
    pub idx: usize,
    pub class: ColumnClass,
}

impl From<&ColumnMeta> for SiblingRef {
    fn from(column: &ColumnMeta) -> Self {
        Self {
            name: column.name.clone(),
            idx: column.idx,
            class: column.class,
        }
    }
}

/// Where one side of the window comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundSource<T> {
    /// The domain bound
    Default,
    /// A configured literal
    Fixed(T),
    /// The current row's value of a sibling column
    Column(SiblingRef),
}

impl<T> BoundSource<T> {
    pub fn is_column(&self) -> bool {
        matches!(self, Self::Column(_))
    }
}

/// Per-row bounds: the domain to validate against and both sources.
#[derive(Debug, Clone)]
pub struct DynamicBounds<T: DomainValue> {
    domain: BoundedDomain<T>,
    min: BoundSource<T>,
    max: BoundSource<T>,
    precision: Option<T::Precision>,
}

impl<T: DomainValue> DynamicBounds<T> {
    fn side(&self, source: &BoundSource<T>, row: &dyn RowAccessor) -> Result<Option<T>, RowError> {
        match source {
            BoundSource::Default => Ok(None),
            BoundSource::Fixed(value) => Ok(Some(*value)),
            BoundSource::Column(sibling) => {
                let Some(cell) = row.value(sibling.idx)? else {
                    return Ok(None);
                };
                T::from_column_value(&cell)
                    .map(Some)
                    .ok_or(RowError::UnexpectedValue {
                        column: sibling.idx,
                        found: cell.class(),
                        kind: T::KIND,
                    })
            }
        }
    }
}

/// Produces the limiter for each row.
#[derive(Debug, Clone)]
pub enum ThresholdResolver<T: DomainValue> {
    Static(Limiter<T>),
    Dynamic(DynamicBounds<T>),
}

impl<T: DomainValue> ThresholdResolver<T> {
    /// Pick the mode from the bound sources.
    ///
    /// Static bounds are validated now. Dynamic sources are checked for
    /// column compatibility now; their values are validated per row.
    pub fn new(
        domain: BoundedDomain<T>,
        min: BoundSource<T>,
        max: BoundSource<T>,
        precision: Option<T::Precision>,
    ) -> Result<Self, SetupError> {
        if !min.is_column() && !max.is_column() {
            let limiter = domain.limiter(fixed(&min), fixed(&max), precision)?;
            return Ok(Self::Static(limiter));
        }

        for source in [&min, &max] {
            if let BoundSource::Column(sibling) = source {
                if !T::accepts(sibling.class) {
                    return Err(SetupError::IncompatibleColumn {
                        column: sibling.name.clone(),
                        class: sibling.class,
                        kind: T::KIND,
                    });
                }
            }
        }

        // Literal sides must already fit the domain
        domain.limiter(fixed(&min), None, precision)?;
        domain.limiter(None, fixed(&max), precision)?;

        Ok(Self::Dynamic(DynamicBounds {
            domain,
            min,
            max,
            precision,
        }))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// The limiter for `row`.
    pub fn resolve(&self, row: &dyn RowAccessor) -> Result<Limiter<T>, RowError> {
        match self {
            Self::Static(limiter) => Ok(*limiter),
            Self::Dynamic(bounds) => {
                let min = bounds.side(&bounds.min, row)?;
                let max = bounds.side(&bounds.max, row)?;
                Ok(bounds.domain.limiter(min, max, bounds.precision)?)
            }
        }
    }
}

fn fixed<T: Copy>(source: &BoundSource<T>) -> Option<T> {
    match source {
        BoundSource::Fixed(value) => Some(*value),
        _ => None,
    }
}

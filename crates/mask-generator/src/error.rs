//! Error types for the generation engine.
//!
//! Errors are split by blast radius: a [`SetupError`] prevents a transformer
//! from being built at all, a [`RowError`] fails exactly one row.

use crate::bytes::GeneratorError;
use mask_core::{AccessError, ColumnClass, SchemaError, TransformerKind, ValueKind};
use std::fmt;

/// Which bound a value violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Requested value below the domain minimum
    BelowDomainMin,
    /// Requested value above the domain maximum
    AboveDomainMax,
    /// Requested minimum above the requested maximum
    MinAboveMax,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::BelowDomainMin => "below domain minimum",
            Self::AboveDomainMax => "above domain maximum",
            Self::MinAboveMax => "greater than requested maximum",
        };
        f.write_str(msg)
    }
}

/// A threshold outside the domain, or an inverted `[min, max]` pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} value {value} is {violation} {bound}")]
pub struct DomainError {
    pub kind: ValueKind,
    pub violation: Violation,
    /// Offending value
    pub value: String,
    /// Violated bound
    pub bound: String,
}

impl DomainError {
    pub fn new(
        kind: ValueKind,
        violation: Violation,
        value: impl fmt::Display,
        bound: impl fmt::Display,
    ) -> Self {
        Self {
            kind,
            violation,
            value: value.to_string(),
            bound: bound.to_string(),
        }
    }
}

/// Fatal error raised while building a transformer.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Storage size without a default domain
    #[error("Unsupported {kind} storage size: {size}")]
    UnsupportedSize { kind: ValueKind, size: usize },

    /// Static thresholds outside the domain or inverted
    #[error("Invalid static bounds: {0}")]
    Domain(#[from] DomainError),

    /// Dynamic bound column cannot hold values of the target kind
    #[error("Column '{column}' of class {class} cannot source {kind} bounds")]
    IncompatibleColumn {
        column: String,
        class: ColumnClass,
        kind: ValueKind,
    },

    /// Transformed column has a class the transformer does not handle
    #[error("Transformer {transformer} does not support column '{column}' of class {class}")]
    UnsupportedColumn {
        transformer: TransformerKind,
        column: String,
        class: ColumnClass,
    },

    /// Noise ratios outside `0 <= min <= max`
    #[error("Invalid noise ratio range [{min}, {max}]")]
    InvalidRatio { min: String, max: String },

    /// Parameter value that cannot be used for this transformer
    #[error("Invalid '{parameter}' parameter: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// Column lookup failure
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Entropy source unavailable
    #[error("Failed to initialise byte generator: {0}")]
    Generator(#[from] GeneratorError),
}

/// Error scoped to a single row.
#[derive(Debug, thiserror::Error)]
pub enum RowError {
    /// Dynamic thresholds outside the domain or inverted
    #[error("Dynamic bounds rejected: {0}")]
    Domain(#[from] DomainError),

    /// Byte generator failure
    #[error("Byte generator failed: {0}")]
    Generator(#[from] GeneratorError),

    /// Row accessor failure
    #[error("Row access failed: {0}")]
    Access(#[from] AccessError),

    /// Cell value of a class that cannot be read as the domain kind
    #[error("Column {column} holds a {found} value, expected {kind}")]
    UnexpectedValue {
        column: usize,
        found: ColumnClass,
        kind: ValueKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_carries_value_and_bound() {
        let err = DomainError::new(ValueKind::Int, Violation::AboveDomainMax, 40000, 32767);
        assert_eq!(err.value, "40000");
        assert_eq!(err.bound, "32767");
        assert_eq!(err.to_string(), "int value 40000 is above domain maximum 32767");
    }

    #[test]
    fn test_row_error_from_domain_error() {
        let err: RowError =
            DomainError::new(ValueKind::Float, Violation::MinAboveMax, 10.5, 3.0).into();
        assert!(matches!(
            err,
            RowError::Domain(DomainError {
                violation: Violation::MinAboveMax,
                ..
            })
        ));
    }
}

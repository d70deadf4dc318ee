//! Column and value-kind metadata.
//!
//! `ColumnMeta` is what the surrounding dump pipeline knows about a column
//! (semantic class and storage size). The generation engine uses it to derive
//! absolute bounds and to check that dynamic bound sources are compatible with
//! the column being transformed.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for table metadata lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Column not found in table metadata
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Failed to parse table metadata
    #[error("Failed to parse table metadata: {0}")]
    Parse(String),
}

// ============================================================================
// Kinds and Classes
// ============================================================================

/// Semantic category governing arithmetic and bounds of generated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Signed integers (2, 4 or 8 bytes of storage)
    Int,
    /// IEEE 754 floating point (4 or 8 bytes of storage)
    Float,
    /// Exact decimal with a fixed number of digits
    Decimal,
    /// Point in time with nanosecond resolution
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// Semantic class of a stored column, as reported by the metadata provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    Int,
    Float,
    Decimal,
    Date,
    Timestamp,
    Text,
}

impl ColumnClass {
    /// Whether values of this class are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::Decimal)
    }

    /// Whether values of this class are points in time.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }
}

impl fmt::Display for ColumnClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Timestamp => "timestamp",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Column and Table Metadata
// ============================================================================

/// Column metadata - storage size and semantic class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name
    pub name: String,

    /// Position of the column within the row
    #[serde(default)]
    pub idx: usize,

    /// Semantic class
    #[serde(rename = "class")]
    pub class: ColumnClass,

    /// Storage size in bytes, when the provider knows it
    #[serde(default)]
    pub length: Option<usize>,

    /// Total number of digits (decimal columns)
    #[serde(default)]
    pub precision: Option<u8>,

    /// Number of digits after the decimal point (decimal columns)
    #[serde(default)]
    pub scale: Option<u8>,
}

impl ColumnMeta {
    /// Create a new column description. The position is assigned by [`TableMeta::new`].
    pub fn new(name: impl Into<String>, class: ColumnClass) -> Self {
        Self {
            name: name.into(),
            idx: 0,
            class,
            length: None,
            precision: None,
            scale: None,
        }
    }

    /// Set the storage size in bytes.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the decimal precision and scale.
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
}

/// Table metadata - ordered columns with name lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Table name
    pub name: String,

    /// Columns in row order
    pub columns: Vec<ColumnMeta>,
}

impl TableMeta {
    /// Create table metadata, assigning each column its row position.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMeta>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(idx, mut column)| {
                column.idx = idx;
                column
            })
            .collect();
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Parse table metadata from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let parsed: TableMeta =
            serde_yaml::from_str(yaml).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Ok(Self::new(parsed.name, parsed.columns))
    }

    /// Get a column by name.
    pub fn column_by_name(&self, name: &str) -> Result<&ColumnMeta, SchemaError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_meta_assigns_positions() {
        let table = TableMeta::new(
            "users",
            vec![
                ColumnMeta::new("id", ColumnClass::Int).with_length(8),
                ColumnMeta::new("salary", ColumnClass::Decimal).with_precision(10, 2),
                ColumnMeta::new("born_at", ColumnClass::Date),
            ],
        );

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_by_name("id").unwrap().idx, 0);
        assert_eq!(table.column_by_name("born_at").unwrap().idx, 2);
        assert_eq!(table.column_by_name("salary").unwrap().scale, Some(2));
    }

    #[test]
    fn test_column_not_found() {
        let table = TableMeta::new("users", vec![ColumnMeta::new("id", ColumnClass::Int)]);
        let err = table.column_by_name("missing").unwrap_err();
        assert_eq!(
            err,
            SchemaError::ColumnNotFound {
                table: "users".to_string(),
                column: "missing".to_string(),
            }
        );
    }

    #[test]
    fn test_table_meta_from_yaml() {
        let yaml = r#"
name: payments
columns:
  - name: id
    class: int
    length: 8
  - name: amount
    class: decimal
    precision: 12
    scale: 2
  - name: paid_at
    class: timestamp
"#;
        let table = TableMeta::from_yaml(yaml).unwrap();
        let amount = table.column_by_name("amount").unwrap();
        assert_eq!(amount.idx, 1);
        assert_eq!(amount.class, ColumnClass::Decimal);
        assert_eq!(amount.scale, Some(2));
        assert_eq!(table.column_by_name("paid_at").unwrap().length, None);
    }

    #[test]
    fn test_column_class_categories() {
        assert!(ColumnClass::Decimal.is_numeric());
        assert!(!ColumnClass::Text.is_numeric());
        assert!(ColumnClass::Date.is_temporal());
        assert_eq!(ColumnClass::Timestamp.to_string(), "timestamp");
        assert_eq!(ValueKind::Decimal.to_string(), "decimal");
    }
}

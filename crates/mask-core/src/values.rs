//! Cell values and the row accessor contract.
//!
//! Transformers never see the storage format directly. They read the raw
//! encoding of a cell (fed to the deterministic engine as hash input), read
//! typed values for the transformed column and its sibling bound columns, and
//! write typed results back through [`RowAccessor`].

use crate::types::ColumnClass;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Error type for row access operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccessError {
    /// Column position outside of the row
    #[error("Column index {idx} out of range for row of {len} columns")]
    ColumnOutOfRange { idx: usize, len: usize },
}

/// Typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Signed integer
    Int(i64),

    /// Floating point number
    Float(f64),

    /// Exact decimal
    Decimal(Decimal),

    /// Calendar date
    Date(NaiveDate),

    /// Timestamp (UTC)
    Timestamp(DateTime<Utc>),

    /// Text
    Text(String),
}

impl ColumnValue {
    /// The column class this value belongs to.
    pub fn class(&self) -> ColumnClass {
        match self {
            Self::Int(_) => ColumnClass::Int,
            Self::Float(_) => ColumnClass::Float,
            Self::Decimal(_) => ColumnClass::Decimal,
            Self::Date(_) => ColumnClass::Date,
            Self::Timestamp(_) => ColumnClass::Timestamp,
            Self::Text(_) => ColumnClass::Text,
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            Self::Int(i) => Some(Decimal::from(*i)),
            _ => None,
        }
    }

    /// Try to get this value as a timestamp. Dates map to midnight UTC.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            Self::Date(d) => d.and_hms_opt(0, 0, 0).map(|n| n.and_utc()),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Append the text encoding of this value to `buf`.
    pub fn encode_text(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Text(s) => buf.extend_from_slice(s.as_bytes()),
            other => buf.extend_from_slice(other.to_string().as_bytes()),
        }
    }
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Row read/write contract consumed by transformers.
///
/// A `None` value is a SQL NULL.
pub trait RowAccessor {
    /// Number of columns in the row.
    fn column_count(&self) -> usize;

    /// Replace the contents of `buf` with the raw encoding of a cell.
    ///
    /// Returns `false` when the cell is NULL, leaving `buf` empty.
    fn raw_bytes(&self, idx: usize, buf: &mut Vec<u8>) -> Result<bool, AccessError>;

    /// Read the typed value of a cell.
    fn value(&self, idx: usize) -> Result<Option<ColumnValue>, AccessError>;

    /// Overwrite a cell.
    fn set_value(&mut self, idx: usize, value: Option<ColumnValue>) -> Result<(), AccessError>;
}

/// In-memory row holding typed cells; raw bytes are their text encoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Option<ColumnValue>>,
}

impl Row {
    /// Create a new row from cell values.
    pub fn new(values: Vec<Option<ColumnValue>>) -> Self {
        Self { values }
    }

    /// Get a cell by position.
    pub fn get(&self, idx: usize) -> Option<&ColumnValue> {
        self.values.get(idx).and_then(Option::as_ref)
    }

    /// All cells in column order.
    pub fn values(&self) -> &[Option<ColumnValue>] {
        &self.values
    }

    fn cell(&self, idx: usize) -> Result<&Option<ColumnValue>, AccessError> {
        self.values.get(idx).ok_or(AccessError::ColumnOutOfRange {
            idx,
            len: self.values.len(),
        })
    }
}

impl RowAccessor for Row {
    fn column_count(&self) -> usize {
        self.values.len()
    }

    fn raw_bytes(&self, idx: usize, buf: &mut Vec<u8>) -> Result<bool, AccessError> {
        buf.clear();
        match self.cell(idx)? {
            Some(value) => {
                value.encode_text(buf);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn value(&self, idx: usize) -> Result<Option<ColumnValue>, AccessError> {
        Ok(self.cell(idx)?.clone())
    }

    fn set_value(&mut self, idx: usize, value: Option<ColumnValue>) -> Result<(), AccessError> {
        let len = self.values.len();
        let cell = self
            .values
            .get_mut(idx)
            .ok_or(AccessError::ColumnOutOfRange { idx, len })?;
        *cell = value;
        Ok(())
    }
}

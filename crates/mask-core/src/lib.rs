//! Core types for the datamask column transformation engine.
//!
//! This crate provides the foundational types shared by the value
//! generation engine and the transformer layer:
//!
//! - [`ValueKind`] / [`ColumnClass`] - Semantic categories of generated values and columns
//! - [`ColumnMeta`] / [`TableMeta`] - Column storage metadata used to derive domains
//! - [`ColumnValue`] - Typed cell values read from and written to rows
//! - [`RowAccessor`] - The row read/write contract, with the in-memory [`Row`]
//! - [`TransformerConfig`] / [`MaskingConfig`] - Typed transformer configuration loaded from YAML
//!
//! # Architecture
//!
//! ```text
//! mask-core (this crate)
//!    │
//!    ├─── mask-generator  (bounded value generation engine)
//!    │
//!    └─── datamask        (numeric and temporal transformers)
//! ```
//!
//! # Example
//!
//! ```rust
//! use mask_core::{ColumnClass, ColumnMeta, ColumnValue, Row, RowAccessor, TableMeta};
//!
//! let table = TableMeta::new(
//!     "orders",
//!     vec![
//!         ColumnMeta::new("id", ColumnClass::Int).with_length(8),
//!         ColumnMeta::new("amount", ColumnClass::Float).with_length(8),
//!     ],
//! );
//! assert_eq!(table.column_by_name("amount").unwrap().idx, 1);
//!
//! let row = Row::new(vec![Some(ColumnValue::Int(1)), Some(ColumnValue::Float(9.5))]);
//! assert_eq!(row.value(1).unwrap(), Some(ColumnValue::Float(9.5)));
//! ```

pub mod config;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use config::{
    BoundConfig, ConfigError, Engine, IntervalConfig, MaskingConfig, RatioConfig,
    TransformerConfig, TransformerKind, TruncateUnit,
};
pub use types::{ColumnClass, ColumnMeta, SchemaError, TableMeta, ValueKind};
pub use values::{AccessError, ColumnValue, Row, RowAccessor};

//! Datamask Library
//!
//! Numeric and temporal column transformers for anonymizing table rows as
//! they stream through a dump or restore.
//!
//! # Features
//!
//! - Uniform replacement: `random_int`, `random_float`, `random_numeric`, `random_date`
//! - Noise: `noise_int`, `noise_float`, `noise_numeric`, `noise_date`
//! - Engines: `random` (fresh entropy) or `deterministic` (salted hash of the original)
//! - Storage-safe output: every value fits the column's storage type
//! - Dynamic thresholds: `min`/`max` read per row from sibling columns
//!
//! # Crates
//!
//! - `mask_core` - Column metadata, row accessor and configuration types
//! - `mask_generator` - The bounded value generation engine
//!
//! # Example
//!
//! ```rust
//! use datamask::MaskingPipeline;
//! use mask_core::{ColumnClass, ColumnMeta, ColumnValue, MaskingConfig, Row, TableMeta};
//!
//! let table = TableMeta::new(
//!     "people",
//!     vec![ColumnMeta::new("age", ColumnClass::Int).with_length(2)],
//! );
//! let config = MaskingConfig::from_yaml(r#"
//! salt: "k"
//! transformers:
//!   - transformer: random_int
//!     column: age
//!     engine: deterministic
//!     min: 18
//!     max: 90
//! "#).unwrap();
//!
//! let mut pipeline = MaskingPipeline::from_config(&table, &config).unwrap();
//! let mut row = Row::new(vec![Some(ColumnValue::Int(42))]);
//! pipeline.apply(&mut row).unwrap();
//!
//! let age = row.get(0).and_then(ColumnValue::as_i64).unwrap();
//! assert!((18..=90).contains(&age));
//! ```

pub mod config;
pub mod pipeline;
pub mod transformers;

pub use config::{load_config, load_job, load_table, MaskingJob};
pub use pipeline::{BatchReport, MaskingPipeline, RowFailure};
pub use transformers::{build_transformer, ColumnTarget, Transformer};

//! Bounded value generation engine for datamask transformers.
//!
//! Produces values that are either drawn uniformly from a window or derived
//! from an original value plus noise. Every output stays inside the storage
//! domain of the target column and honours the configured precision.
//!
//! # Architecture
//!
//! ```text
//!  ColumnMeta (size hint)          TransformerConfig (min/max/precision)
//!         │                                   │
//!         ▼                                   ▼
//! ┌────────────────┐   limiter()   ┌──────────────────────┐
//! │ BoundedDomain  │──────────────▶│  ThresholdResolver   │
//! │  [dmin, dmax]  │               │  Static(Limiter)     │
//! └────────────────┘               │  Dynamic(siblings)   │
//!                                  └──────────┬───────────┘
//!                                             │ resolve(row)
//!  ByteGenerator ────────┐                    ▼
//!  (random | salted hash) │            Limiter [min, max] + precision
//!                         ▼                   │
//!            UniformTransform / NoiseTransform ◀┘
//!                         │
//!                         ▼
//!               value in [min, max]
//! ```
//!
//! The algorithms are generic over [`DomainValue`], implemented for `i64`,
//! `f64`, [`rust_decimal::Decimal`] and `chrono::DateTime<Utc>`.
//!
//! # Example
//!
//! ```rust
//! use mask_generator::{BoundedDomain, DeterministicGenerator, Salt, UniformTransform};
//!
//! let limiter = BoundedDomain::<i64>::from_size(2)
//!     .unwrap()
//!     .limiter(Some(1), Some(100), None)
//!     .unwrap();
//! let mut transform = UniformTransform::new(Box::new(DeterministicGenerator::new(Salt::new("k"))));
//!
//! let first = transform.generate(&limiter, b"42").unwrap();
//! assert!((1..=100).contains(&first));
//! assert_eq!(transform.generate(&limiter, b"42").unwrap(), first);
//! ```
//!
//! The engine never logs and never retries: failures are returned as
//! [`SetupError`] (transformer cannot be built) or [`RowError`] (one row fails).

pub mod bytes;
pub mod domain;
pub mod error;
pub mod noise;
pub mod resolver;
pub mod truncate;
pub mod uniform;
pub mod value;

pub use bytes::{
    generator_for, ByteGenerator, DeterministicGenerator, GeneratorError, RandomGenerator, Salt,
};
pub use domain::{BoundedDomain, Limiter};
pub use error::{DomainError, RowError, SetupError, Violation};
pub use noise::{NoiseTransform, RatioSpec, ShiftSpec, Spread, DEFAULT_MAX_RATIO, DEFAULT_MIN_RATIO};
pub use resolver::{BoundSource, DynamicBounds, SiblingRef, ThresholdResolver};
pub use truncate::{round_decimal, round_float, truncate_timestamp};
pub use uniform::UniformTransform;
pub use value::{DomainValue, Offset, Proportional, MAX_DECIMAL_DIGITS};

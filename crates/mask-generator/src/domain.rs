//! Absolute domains and the validated windows inside them.

use crate::error::{DomainError, SetupError, Violation};
use crate::value::DomainValue;

/// Absolute `[min, max]` a value kind may take for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedDomain<T: DomainValue> {
    min: T,
    max: T,
    size_hint: usize,
}

impl<T: DomainValue> BoundedDomain<T> {
    /// Domain for a storage size hint (bytes for int/float, digits for decimal).
    pub fn from_size(size_hint: usize) -> Result<Self, SetupError> {
        let (min, max) = T::default_bounds(size_hint)?;
        Ok(Self {
            min,
            max,
            size_hint,
        })
    }

    /// Domain with explicit absolute bounds.
    pub fn with_bounds(min: T, max: T) -> Result<Self, DomainError> {
        if min > max {
            return Err(DomainError::new(T::KIND, Violation::MinAboveMax, min, max));
        }
        Ok(Self {
            min,
            max,
            size_hint: 0,
        })
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn size_hint(&self) -> usize {
        self.size_hint
    }

    /// Build a limiter, defaulting each missing side to the domain bound.
    ///
    /// Fails when either side leaves the domain or `min > max`.
    pub fn limiter(
        &self,
        min: Option<T>,
        max: Option<T>,
        precision: Option<T::Precision>,
    ) -> Result<Limiter<T>, DomainError> {
        let min = min.unwrap_or(self.min);
        let max = max.unwrap_or(self.max);
        self.check(min)?;
        self.check(max)?;
        if min > max {
            return Err(DomainError::new(T::KIND, Violation::MinAboveMax, min, max));
        }
        Ok(Limiter {
            min,
            max,
            precision,
        })
    }

    fn check(&self, value: T) -> Result<(), DomainError> {
        if value < self.min {
            return Err(DomainError::new(
                T::KIND,
                Violation::BelowDomainMin,
                value,
                self.min,
            ));
        }
        if value > self.max {
            return Err(DomainError::new(
                T::KIND,
                Violation::AboveDomainMax,
                value,
                self.max,
            ));
        }
        // NaN compares false against both bounds
        if value.partial_cmp(&value).is_none() {
            return Err(DomainError::new(
                T::KIND,
                Violation::BelowDomainMin,
                value,
                self.min,
            ));
        }
        Ok(())
    }
}

/// Validated `[min, max]` window plus precision.
///
/// Only [`BoundedDomain::limiter`] builds one, so
/// `domain.min <= min <= max <= domain.max` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter<T: DomainValue> {
    min: T,
    max: T,
    precision: Option<T::Precision>,
}

impl<T: DomainValue> Limiter<T> {
    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn precision(&self) -> Option<T::Precision> {
        self.precision
    }

    /// Clamp `value` into the window and apply the precision policy.
    pub fn fit(&self, value: T) -> T {
        value.fit(self.min, self.max, self.precision)
    }

    /// Generator bytes needed for a uniform draw over the window.
    pub fn draw_len(&self) -> usize {
        T::draw_len(self.min, self.max, self.precision)
    }

    /// Map generator bytes onto the window, then apply the precision policy.
    pub fn draw(&self, bytes: &[u8]) -> T {
        self.fit(T::from_draw(bytes, self.min, self.max, self.precision))
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }
}

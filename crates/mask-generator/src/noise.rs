//! Noise: original value plus a signed, bounded delta.
//!
//! Each call draws 9 generator bytes. Byte 0 picks the sign (even means
//! negative) and bytes 1..9 give a fraction in `[0, 1)` that positions the
//! delta inside the spread. The candidate is then clamped into the limiter's
//! window, never resampled, and the precision policy applied.

use crate::bytes::{ByteGenerator, GeneratorError};
use crate::domain::Limiter;
use crate::error::SetupError;
use crate::value::{unit_fraction, Offset, Proportional};
use chrono::{DateTime, TimeDelta, Utc};

const NOISE_DRAW_LEN: usize = 9;

/// Default lower noise ratio.
pub const DEFAULT_MIN_RATIO: f64 = 0.05;

/// Default upper noise ratio.
pub const DEFAULT_MAX_RATIO: f64 = 0.2;

/// Sizes the delta for a given original and fraction.
pub trait Spread<T: Offset>: Send {
    fn delta(&self, original: T, frac: f64) -> T::Delta;
}

/// Delta as a fraction of `|original|`, between `min` and `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioSpec {
    min: f64,
    max: f64,
}

impl RatioSpec {
    /// Requires `0 <= min <= max`, both finite.
    pub fn new(min: f64, max: f64) -> Result<Self, SetupError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return Err(SetupError::InvalidRatio {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn ratio(&self, frac: f64) -> f64 {
        self.min + frac * (self.max - self.min)
    }
}

impl Default for RatioSpec {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_RATIO,
            max: DEFAULT_MAX_RATIO,
        }
    }
}

impl<T: Proportional> Spread<T> for RatioSpec {
    fn delta(&self, original: T, frac: f64) -> T::Delta {
        original.proportion(self.ratio(frac))
    }
}

/// Timestamp shift between two non-negative durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSpec {
    min: TimeDelta,
    max: TimeDelta,
}

impl ShiftSpec {
    /// Requires `0 <= min <= max`.
    pub fn new(min: TimeDelta, max: TimeDelta) -> Result<Self, SetupError> {
        if min < TimeDelta::zero() || min > max {
            return Err(SetupError::InvalidRatio {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> TimeDelta {
        self.min
    }

    pub fn max(&self) -> TimeDelta {
        self.max
    }

    fn shift(&self, frac: f64) -> TimeDelta {
        let span = self.max - self.min;
        let part = match span.num_nanoseconds() {
            Some(nanos) => TimeDelta::nanoseconds((nanos as f64 * frac) as i64),
            None => TimeDelta::try_milliseconds((span.num_milliseconds() as f64 * frac) as i64)
                .unwrap_or(span),
        };
        self.min.checked_add(&part).unwrap_or(self.max)
    }
}

impl Spread<DateTime<Utc>> for ShiftSpec {
    fn delta(&self, _original: DateTime<Utc>, frac: f64) -> TimeDelta {
        self.shift(frac)
    }
}

/// Perturbs originals by a signed delta sized by `S`.
pub struct NoiseTransform<T: Offset, S: Spread<T>> {
    generator: Box<dyn ByteGenerator>,
    spread: S,
    scratch: [u8; NOISE_DRAW_LEN],
    _kind: std::marker::PhantomData<fn() -> T>,
}

impl<T: Offset, S: Spread<T>> NoiseTransform<T, S> {
    pub fn new(generator: Box<dyn ByteGenerator>, spread: S) -> Self {
        Self {
            generator,
            spread,
            scratch: [0; NOISE_DRAW_LEN],
            _kind: std::marker::PhantomData,
        }
    }

    /// Noise `original`, clamped into the limiter's window.
    ///
    /// `input` is the raw encoding of the original cell.
    pub fn generate(
        &mut self,
        limiter: &Limiter<T>,
        original: T,
        input: &[u8],
    ) -> Result<T, GeneratorError> {
        self.generator.generate(input, &mut self.scratch)?;
        let negative = self.scratch[0] % 2 == 0;
        let frac = unit_fraction(&self.scratch[1..]);
        let delta = self.spread.delta(original, frac);
        Ok(limiter.fit(original.offset(delta, negative)))
    }
}

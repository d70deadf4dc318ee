//! Uniform draws across a limiter's window.

use crate::bytes::{ByteGenerator, GeneratorError};
use crate::domain::Limiter;
use crate::value::DomainValue;
use std::marker::PhantomData;

/// Draws values uniformly from `[min, max]`.
///
/// Owns its generator and scratch buffer; one instance serves one worker.
pub struct UniformTransform<T: DomainValue> {
    generator: Box<dyn ByteGenerator>,
    scratch: Vec<u8>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: DomainValue> UniformTransform<T> {
    pub fn new(generator: Box<dyn ByteGenerator>) -> Self {
        Self {
            generator,
            scratch: Vec::new(),
            _kind: PhantomData,
        }
    }

    /// Draw one value.
    ///
    /// `input` is the raw encoding of the original cell; the deterministic
    /// engine derives its bytes from it.
    pub fn generate(&mut self, limiter: &Limiter<T>, input: &[u8]) -> Result<T, GeneratorError> {
        self.scratch.resize(limiter.draw_len(), 0);
        self.generator.generate(input, &mut self.scratch)?;
        Ok(limiter.draw(&self.scratch))
    }
}

use std::fmt::Debug;

use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::types::SamplerError;

/// Trait for providing resources to samplers.
pub trait HasSamplerResources: Debug {
    /// Allows a sampler to mutably access the RNG (if present).
    fn with_rng_mut(&mut self, _fun: &mut dyn FnMut(&mut dyn RngCore)) -> Result<(), SamplerError> {
        Err(SamplerError::MissingResource("rng".to_string()))
    }
}

#[derive(Debug, Clone, Default)]
/// Empty resource structure for use with samplers that don't require
/// any resources.
pub struct NilSamplerResources;

impl NilSamplerResources {
    pub fn new() -> Self {
        Self
    }
}

impl HasSamplerResources for NilSamplerResources {}

impl HasSamplerResources for () {}

/// Resources owning an RNG. This is what a decode call carries for its
/// lifetime.
pub struct SimpleSamplerResources {
    pub(crate) rng: Option<Box<dyn RngCore + Send + Sync>>,
}

impl Debug for SimpleSamplerResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerResources")
            .field("rng", &self.rng.is_some())
            .finish()
    }
}

impl SimpleSamplerResources {
    pub fn new(rng: Option<Box<dyn RngCore + Send + Sync>>) -> Self {
        Self { rng }
    }

    /// Create resources holding a [StdRng]. If the seed isn't specified,
    /// available entropy is used to seed the RNG.
    pub fn new_seedable(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self::new(Some(Box::new(rng)))
    }
}

impl HasSamplerResources for SimpleSamplerResources {
    fn with_rng_mut(&mut self, fun: &mut dyn FnMut(&mut dyn RngCore)) -> Result<(), SamplerError> {
        self.rng.as_mut().map_or_else(
            || Err(SamplerError::MissingResource("rng".to_string())),
            |rng| {
                fun(rng.as_mut());
                Ok(())
            },
        )
    }
}

/// Resources borrowing a caller-owned RNG for the duration of one call.
pub struct BorrowedRngResources<'a> {
    rng: &'a mut dyn RngCore,
}

impl<'a> BorrowedRngResources<'a> {
    pub fn new(rng: &'a mut dyn RngCore) -> Self {
        Self { rng }
    }
}

impl Debug for BorrowedRngResources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BorrowedRngResources").finish_non_exhaustive()
    }
}

impl HasSamplerResources for BorrowedRngResources<'_> {
    fn with_rng_mut(&mut self, fun: &mut dyn FnMut(&mut dyn RngCore)) -> Result<(), SamplerError> {
        fun(&mut *self.rng);
        Ok(())
    }
}

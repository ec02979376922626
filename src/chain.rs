use std::{
    fmt::Debug,
    ops::{Add, AddAssign},
};

use crate::types::{HasSamplerResources, Logits, Sampler, SamplerError, TID};

#[derive(Default, Debug)]
/// A list of [Sampler]s that can be run in sequence. It implements `Sampler`
/// so you can build samplers as modular components. The decode loop builds one
/// from a [SamplingConfig](crate::params::SamplingConfig): filtering samplers
/// followed by a token-picking sampler as the last item, which is what makes
/// [Sampler::sample_token] on the chain return a token.
pub struct SamplerChain {
    samplers: Vec<Box<dyn Sampler>>,
    token: Option<TID>,
}

impl SamplerChain {
    pub fn new() -> Self {
        Self {
            samplers: vec![],
            token: None,
        }
    }

    pub fn push_sampler(&mut self, sampler: impl Sampler + Send + Sync + 'static) -> &mut Self {
        self.token = None;
        self.samplers.push(Box::new(sampler));
        self
    }

    /// Number of samplers in the chain.
    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}

impl Sampler for SamplerChain {
    fn sample<'a>(
        &mut self,
        res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError> {
        self.token = None;
        self.samplers
            .iter_mut()
            .try_fold(logits, |logits, sampler| {
                let new_logits = sampler.sample(res, logits)?;
                self.token = sampler.sampled_token_id();
                Ok(new_logits)
            })
    }

    fn sampled_token_id(&self) -> Option<TID> {
        self.token
    }
}

impl<Rhs> AddAssign<Rhs> for SamplerChain
where
    Rhs: Sampler + Send + Sync + 'static,
{
    fn add_assign(&mut self, rhs: Rhs) {
        let _ = self.push_sampler(rhs);
    }
}

impl<Rhs> Add<Rhs> for SamplerChain
where
    Rhs: Sampler + Send + Sync + 'static,
{
    type Output = Self;

    fn add(mut self, rhs: Rhs) -> Self::Output {
        self += rhs;
        self
    }
}

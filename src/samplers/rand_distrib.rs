use rand::distributions::{Distribution, WeightedIndex};

use crate::types::*;

/// # Random distribution sampling
/// Renormalizes whatever probability mass the earlier samplers left and
/// draws one token from it using the RNG resource.
///
/// **Properties**:
/// - Selects a token
///
/// **Parameters**:
/// - (none)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SampleRandDistrib {
    token_id: Option<TID>,
}

impl SampleRandDistrib {
    pub fn new() -> Self {
        Self { token_id: None }
    }
}

impl Sampler for SampleRandDistrib {
    fn sample<'a>(
        &mut self,
        res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError> {
        self.token_id = None;
        logits.ensure_softmax()?.renormalize()?;

        let dist = WeightedIndex::new(logits.iter().map(|l| l.prob))
            .map_err(SamplerError::RandWeightedError)?;

        let mut tid = None;
        res.with_rng_mut(&mut |r| tid = Some(logits[dist.sample(r)].token_id))?;
        self.token_id = tid;
        Ok(logits)
    }

    fn sampled_token_id(&self) -> Option<TID> {
        self.token_id
    }
}

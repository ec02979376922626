use crate::types::*;

/// # Top-K sampling
/// Takes the `k`-th largest probability as a threshold and zeroes every
/// entry strictly below it. Ties with the threshold survive, and a `k` larger
/// than the vocabulary leaves everything alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTopK {
    k: usize,
}

impl SampleTopK {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Sampler for SampleTopK {
    fn sample<'a>(
        &mut self,
        _res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError> {
        let k = self.k;
        if k == 0 {
            return Err(SamplerError::InvalidParameter(
                "top_k must be greater than zero".to_string(),
            ));
        }
        logits.ensure_softmax()?;
        if k >= logits.len() {
            return Ok(logits);
        }
        let threshold = logits[k - 1].prob;
        logits
            .iter_mut()
            .filter(|l| l.prob < threshold)
            .for_each(|l| l.prob = 0.0);
        Ok(logits)
    }
}

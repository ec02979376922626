use crate::types::*;

/// # Top-P sampling
/// Walks the probabilities in descending order keeping a running sum.
/// An entry is zeroed when the mass *before* it already exceeds `p`, so the
/// entry that crosses the threshold survives.
///
/// **Properties**:
/// - Filters logits (zeroes probabilities, entries are not removed)
///
/// **Parameters**:
/// - `p`: Target value in `(0, 1]`. (default: `1.0`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleTopP {
    pub(crate) p: L,
}

impl Default for SampleTopP {
    fn default() -> Self {
        Self { p: 1.0 }
    }
}

impl SampleTopP {
    pub fn new(p: L) -> Self {
        Self { p }
    }

    pub fn p(mut self, val: L) -> Self {
        self.p = val;
        self
    }
}

impl Sampler for SampleTopP {
    fn sample<'a>(
        &mut self,
        _res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError> {
        let p = self.p;
        if !(p > 0.0 && p <= 1.0) {
            return Err(SamplerError::InvalidParameter(format!(
                "top_p must be in (0, 1], got {p}"
            )));
        }
        logits.ensure_softmax()?;
        // Nothing can be masked at p == 1; skipping avoids f32 drift in the cumsum.
        if p >= 1.0 {
            return Ok(logits);
        }

        let mut cum_sum = 0f32;
        logits.iter_mut().for_each(|l| {
            cum_sum += l.prob;
            if cum_sum - l.prob > p {
                l.prob = 0.0;
            }
        });
        Ok(logits)
    }
}

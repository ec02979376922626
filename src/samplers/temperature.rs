use crate::types::*;

/// # Temperature sampling
/// Divides every logit by the temperature. Values below `1.0` sharpen the
/// distribution, values above flatten it.
///
/// Logits are shifted so the largest one is `0.0` before dividing. The
/// distribution softmax produces is the same, but a tiny temperature can't
/// push the scaled values to infinity.
///
/// **Properties**:
/// - Modifies logits
///
/// **Parameters**:
/// - `temperature`: Must be finite and greater than zero. (default: `1.0`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleTemperature {
    temperature: L,
}

impl Default for SampleTemperature {
    fn default() -> Self {
        Self { temperature: 1.0 }
    }
}

impl SampleTemperature {
    pub fn new(temperature: L) -> Self {
        Self { temperature }
    }
}

impl Sampler for SampleTemperature {
    fn sample<'a>(
        &mut self,
        _res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError> {
        let temp = self.temperature;
        if !(temp > 0.0 && temp.is_finite()) {
            return Err(SamplerError::InvalidParameter(format!(
                "temperature must be positive and finite, got {temp}"
            )));
        }
        let max = logits
            .iter()
            .map(|l| l.logit)
            .fold(L::NEG_INFINITY, L::max);
        if max.is_finite() {
            logits
                .iter_mut()
                .for_each(|l| l.logit = (l.logit - max) / temp);
        } else {
            logits.iter_mut().for_each(|l| l.logit /= temp);
        }
        // Order is preserved by a positive divisor but probabilities are stale.
        logits.set_has_probs(false);
        Ok(logits)
    }
}

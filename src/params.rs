use rand::RngCore;

use crate::{configure::*, samplers::*, types::*};

/// Stop strings used by the default chat template.
pub const DEFAULT_STOP_SET: &[&str] = &["[|Human|]", "[|AI|]"];

/// Sampling parameters applied at every decode step.
///
/// The pipeline is fixed: temperature, softmax, top-p, top-k, renormalize,
/// weighted draw. See [SamplingConfig::build_chain].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplingConfig {
    /// Divisor applied to the logits. Must be `> 0`.
    pub temperature: L,
    /// Nucleus threshold in `(0, 1]`.
    pub top_p: L,
    /// Number of highest-probability entries kept. Must be `> 0`.
    pub top_k: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            top_k: 30,
        }
    }
}

impl SamplingConfig {
    pub fn new(temperature: L, top_p: L, top_k: usize) -> Self {
        Self {
            temperature,
            top_p,
            top_k,
        }
    }

    /// Checks every field against its domain.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let Self {
            temperature,
            top_p,
            top_k,
        } = *self;
        if !(temperature > 0.0 && temperature.is_finite()) {
            return Err(GenerateError::InvalidParameter(format!(
                "temperature must be positive and finite, got {temperature}"
            )));
        }
        if !(top_p > 0.0 && top_p <= 1.0) {
            return Err(GenerateError::InvalidParameter(format!(
                "top_p must be in (0, 1], got {top_p}"
            )));
        }
        if top_k == 0 {
            return Err(GenerateError::InvalidParameter(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the [SamplerChain] implementing this configuration.
    pub fn build_chain(&self) -> SamplerChain {
        SamplerChain::new()
            + SampleTemperature::new(self.temperature)
            + SampleTopP::new(self.top_p)
            + SampleTopK::new(self.top_k)
            + SampleRandDistrib::new()
    }
}

/// Picks one token id from a raw logit vector.
///
/// This is the one-shot form of running [SamplingConfig::build_chain] over
/// `logits`; the decode loop keeps its chain around instead.
pub fn sample(
    logits: &[L],
    config: &SamplingConfig,
    rng: &mut dyn RngCore,
) -> Result<TID, SamplerError> {
    let mut logits = Logits::try_from(logits)?;
    let mut res = BorrowedRngResources::new(rng);
    config
        .build_chain()
        .sample_token(&mut res, &mut logits)?
        .ok_or_else(|| SamplerError::InternalError("sampler chain picked no token".to_string()))
}

impl HasOptionMetadata for SamplingConfig {
    fn option_metadata(&self) -> ConfigMetadata {
        ConfigMetadata {
            name: "sampling",
            description: Some(concat!(
                "Temperature scaling followed by top-p and top-k filtering ",
                "and a weighted random draw."
            )),
            options: vec![
                OptionMetadata {
                    key: "temperature",
                    description: Some("Divisor applied to logits. Must be greater than 0."),
                    option_type: OptionType::Float,
                },
                OptionMetadata {
                    key: "top_p",
                    description: Some("Cumulative probability threshold in (0, 1]."),
                    option_type: OptionType::Float,
                },
                OptionMetadata {
                    key: "top_k",
                    description: Some("Number of most probable tokens to keep."),
                    option_type: OptionType::UInt,
                },
            ],
        }
    }

    fn options(&self) -> Options<OptionValue<usize, L>> {
        Options::build_options(
            self.option_metadata().options,
            [
                Some(OptionValue::Float(self.temperature)),
                Some(OptionValue::Float(self.top_p)),
                Some(OptionValue::UInt(self.top_k)),
            ],
        )
    }

    fn options_mut(&mut self) -> Options<OptionValueMut<'_, usize, L>> {
        Options::build_options(
            self.option_metadata().options,
            [
                Some(OptionValueMut::Float(&mut self.temperature)),
                Some(OptionValueMut::Float(&mut self.top_p)),
                Some(OptionValueMut::UInt(&mut self.top_k)),
            ],
        )
    }
}

impl Configurable for SamplingConfig {}

/// Everything a single `generate_answer` call needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationParams {
    pub sampling: SamplingConfig,
    /// Decoding stops once any of these appears in the decoded text.
    pub stop_set: Vec<String>,
    /// Token budget for the assembled prompt.
    pub max_length: usize,
    /// Size of the right-aligned window of prompt tokens fed to the model.
    pub max_context_length_tokens: usize,
    /// Upper bound on generated tokens.
    pub max_steps: usize,
    /// RNG seed; `None` seeds from entropy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            stop_set: DEFAULT_STOP_SET.iter().map(|s| s.to_string()).collect(),
            max_length: 256,
            max_context_length_tokens: 180,
            max_steps: 256,
            seed: None,
        }
    }
}

impl GenerationParams {
    pub fn sampling(mut self, val: SamplingConfig) -> Self {
        self.sampling = val;
        self
    }

    pub fn stop_set<S: Into<String>>(mut self, val: impl IntoIterator<Item = S>) -> Self {
        self.stop_set = val.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_length(mut self, val: usize) -> Self {
        self.max_length = val;
        self
    }

    pub fn max_context_length_tokens(mut self, val: usize) -> Self {
        self.max_context_length_tokens = val;
        self
    }

    pub fn max_steps(mut self, val: usize) -> Self {
        self.max_steps = val;
        self
    }

    pub fn seed(mut self, val: Option<u64>) -> Self {
        self.seed = val;
        self
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        self.sampling.validate()?;
        if self.max_length == 0 {
            return Err(GenerateError::InvalidParameter(
                "max_length must be greater than zero".to_string(),
            ));
        }
        if self.max_context_length_tokens == 0 {
            return Err(GenerateError::InvalidParameter(
                "max_context_length_tokens must be greater than zero".to_string(),
            ));
        }
        if self.stop_set.iter().any(String::is_empty) {
            return Err(GenerateError::InvalidParameter(
                "stop strings must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl HasOptionMetadata for GenerationParams {
    fn option_metadata(&self) -> ConfigMetadata {
        let mut options = self.sampling.option_metadata().options;
        options.extend([
            OptionMetadata {
                key: "max_length",
                description: Some("Token budget for the assembled prompt."),
                option_type: OptionType::UInt,
            },
            OptionMetadata {
                key: "max_context_length_tokens",
                description: Some("Number of trailing prompt tokens passed to the model."),
                option_type: OptionType::UInt,
            },
            OptionMetadata {
                key: "max_steps",
                description: Some("Maximum number of tokens to generate."),
                option_type: OptionType::UInt,
            },
        ]);
        ConfigMetadata {
            name: "generation",
            description: Some("Prompt budget, context window and decode limits."),
            options,
        }
    }

    fn options(&self) -> Options<OptionValue<usize, L>> {
        Options::build_options(
            self.option_metadata().options,
            [
                Some(OptionValue::Float(self.sampling.temperature)),
                Some(OptionValue::Float(self.sampling.top_p)),
                Some(OptionValue::UInt(self.sampling.top_k)),
                Some(OptionValue::UInt(self.max_length)),
                Some(OptionValue::UInt(self.max_context_length_tokens)),
                Some(OptionValue::UInt(self.max_steps)),
            ],
        )
    }

    fn options_mut(&mut self) -> Options<OptionValueMut<'_, usize, L>> {
        let md = self.option_metadata().options;
        let Self {
            sampling,
            max_length,
            max_context_length_tokens,
            max_steps,
            ..
        } = self;
        Options::build_options(
            md,
            [
                Some(OptionValueMut::Float(&mut sampling.temperature)),
                Some(OptionValueMut::Float(&mut sampling.top_p)),
                Some(OptionValueMut::UInt(&mut sampling.top_k)),
                Some(OptionValueMut::UInt(max_length)),
                Some(OptionValueMut::UInt(max_context_length_tokens)),
                Some(OptionValueMut::UInt(max_steps)),
            ],
        )
    }
}

impl Configurable for GenerationParams {}

//! # LLM Chat Decode
//!
//! Sampling decode loop and context assembly for chat-style language models.
//!
//! The crate doesn't load models or build tokenizers. You bring those by
//! implementing [crate::model::Model] and [crate::model::Tokenizer]; the
//! crate packs the conversation into a token budget, drives the model one
//! token at a time and samples each token with temperature, top-p and top-k.
//!
//! ## Examples
//!
//! Sampling a single token straight from a logit vector:
//!
//! ```rust
//! use anyhow::Result;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! use llm_chat_decode::prelude::*;
//!
//! pub fn pick() -> Result<()> {
//!     let mut rng = StdRng::seed_from_u64(123);
//!     // Tokens 0 and 2 can never be drawn.
//!     let logits = [f32::NEG_INFINITY, 1.5, f32::NEG_INFINITY];
//!     let config = SamplingConfig::new(0.8, 0.95, 40);
//!     assert_eq!(sample(&logits, &config, &mut rng)?, 1);
//!     Ok(())
//! }
//! # pick().unwrap();
//! ```
//!
//! The same pipeline is available as a [crate::prelude::SamplerChain] when
//! you want to look at the filtered distribution:
//!
//! ```rust
//! use anyhow::Result;
//!
//! use llm_chat_decode::prelude::*;
//!
//! pub fn filter() -> Result<()> {
//!     let probs = [0.1f32, 0.2, 0.3, 0.4];
//!     let mut logits = Logits::try_from_iter(probs.iter().map(|p| p.ln()))?;
//!
//!     let mut sc = SamplerChain::new() + SampleTemperature::new(1.0);
//!     sc += SampleTopP::new(0.45);
//!     sc.push_sampler(SampleTopK::new(3));
//!
//!     // These samplers don't need any resources; `&mut ()` works too.
//!     sc.sample(&mut NilSamplerResources::default(), &mut logits)?;
//!
//!     // Sorted descending: 0.4 and 0.3 survive, the rest is zeroed.
//!     let kept = logits.iter().filter(|l| l.prob > 0.0).count();
//!     assert_eq!(kept, 2);
//!     Ok(())
//! }
//! # filter().unwrap();
//! ```
//!
//! Whole answers come from [crate::generate::Generator] (or the
//! [crate::generate::generate_answer] shortcut), which assembles the prompt,
//! keeps the last `max_context_length_tokens` of it, decodes until a stop
//! string shows up and strips the speaker markers.
//!
//! Parameters can be set from strings:
//!
//! ```rust
//! use anyhow::Result;
//!
//! use llm_chat_decode::prelude::*;
//!
//! pub fn params() -> Result<()> {
//!     let mut params = GenerationParams::default();
//!     params.configure("temp=0.7:top_p=0.9:max_s=64")?;
//!     assert_eq!(params.sampling.top_p, 0.9);
//!     assert_eq!(params.max_steps, 64);
//!     Ok(())
//! }
//! # params().unwrap();
//! ```

/// # Samplers live here!
///
/// Visiting the structs below is probably going to be more helpful than going to the modules.
pub mod samplers;

/// Types and traits.
pub mod types;

/// Sampler chains
mod chain;

/// Sampler resources
mod resource;

/// Configuring options from strings
pub mod configure;

/// Sampling and generation parameters.
pub mod params;

/// The model and tokenizer collaborators.
pub mod model;

/// The token-by-token decode loop.
pub mod decode;

/// Prompt assembly under a token budget.
pub mod context;

/// Entry points tying assembly and decoding together.
pub mod generate;

#[cfg(test)]
mod tests;

/// Convenient rexports. The simplest way to use the crate is to just throw a
/// `use llm_chat_decode::prelude::*;`
/// into your project.
pub mod prelude {
    #[doc(inline)]
    pub use crate::{
        chain::*,
        configure::{Configurable, ConfigureError},
        context::*,
        decode::*,
        generate::*,
        model::*,
        params::*,
        resource::*,
        samplers::*,
        types::*,
    };
}

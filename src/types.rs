use std::{
    fmt::Debug,
    ops::{Deref, DerefMut},
};

use thiserror::Error;

pub use crate::{chain::*, resource::*};

/// Type for token IDs.
pub type TID = u32;

/// Type for logits.
pub type L = f32;

#[derive(Debug, Error)]
/// Sampler errors
pub enum SamplerError {
    #[error("internal error: {0}")]
    /// General internal error type.
    InternalError(String),

    #[error("missing resource error: {0}")]
    /// Missing resource error type.
    MissingResource(String),

    #[error("invalid sampler parameter: {0}")]
    /// A sampler was configured with a value outside its domain.
    InvalidParameter(String),

    #[error("sampling failed: {0}")]
    /// The distribution left after filtering has no mass to sample from.
    SamplingFailure(String),

    #[error("logits error: {0}")]
    /// Container for errors that occured while processing logits.
    LogitsError(LogitsError),

    #[error("rand weights error: {0}")]
    /// RNG weights-related errors
    RandWeightedError(rand::distributions::WeightedError),
}

#[derive(Debug, Clone, Error)]
/// Logit errors
pub enum LogitsError {
    #[error("Invalid logit for token id {0}")]
    /// Contains the position (AKA token id) of the offending logit.
    /// Logits cannot be NaN.
    InvalidLogit(usize),
    #[error("internal logits error: {0}")]
    /// General internal error type.
    InternalError(String),
}

impl From<LogitsError> for SamplerError {
    fn from(value: LogitsError) -> Self {
        SamplerError::LogitsError(value)
    }
}

#[derive(Debug, Error)]
/// Errors surfaced by prompt assembly and generation.
pub enum GenerateError {
    #[error("invalid parameter: {0}")]
    /// Malformed sampling or generation parameters.
    InvalidParameter(String),

    #[error("prompt needs {tokens} tokens but max_length is {max_length}")]
    /// Even the preamble plus the new utterance alone exceeds the budget.
    PromptTooLong { tokens: usize, max_length: usize },

    #[error("sampling failure: {0}")]
    /// A decode step produced a distribution that can't be sampled.
    SamplingFailure(SamplerError),

    #[error("model error: {0}")]
    /// Opaque failure from the model collaborator.
    Model(anyhow::Error),

    #[error("tokenizer error: {0}")]
    /// Opaque failure from the tokenizer collaborator.
    Tokenizer(anyhow::Error),
}

impl From<SamplerError> for GenerateError {
    fn from(value: SamplerError) -> Self {
        match value {
            SamplerError::InvalidParameter(msg) => GenerateError::InvalidParameter(msg),
            other => GenerateError::SamplingFailure(other),
        }
    }
}

impl From<LogitsError> for GenerateError {
    fn from(value: LogitsError) -> Self {
        GenerateError::SamplingFailure(value.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// An individual logit with some additional metadata for use by the samplers.
pub struct Logit {
    /// The token id.
    pub token_id: TID,
    /// The logit value.
    pub logit: L,
    /// Computed probability. Filters zero this rather than removing entries.
    pub prob: L,
}

#[derive(Debug, Clone)]
/// A collection of [Logit]s. You normally will need to build this from the
/// last-position output of the model.
///
/// For convenience, this can [Deref] to the internal [Vec].
pub struct Logits {
    sorted: bool,
    has_probs: bool,
    logits: Vec<Logit>,
}

impl Deref for Logits {
    type Target = Vec<Logit>;

    fn deref(&self) -> &Self::Target {
        &self.logits
    }
}

impl DerefMut for Logits {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.logits
    }
}

impl Logits {
    /// Make a new [Logits] from an iterator of `L`. We'd like to
    /// write this as [TryFrom] but unfortunately the types make this impossible.
    pub fn try_from_iter<I: IntoIterator<Item = L>>(it: I) -> Result<Self, LogitsError> {
        Ok(Self {
            sorted: false,
            has_probs: false,
            logits: it
                .into_iter()
                .enumerate()
                .map(|(idx, logit)| {
                    if logit.is_nan() {
                        Err(LogitsError::InvalidLogit(idx))?
                    }
                    let token_id = TID::try_from(idx).map_err(|_| {
                        LogitsError::InternalError(format!("vocabulary index {idx} overflows"))
                    })?;
                    Ok(Logit {
                        token_id,
                        logit,
                        prob: 0f32,
                    })
                })
                .collect::<Result<Vec<_>, LogitsError>>()?,
        })
    }
}

impl TryFrom<Vec<L>> for Logits {
    type Error = LogitsError;

    fn try_from(value: Vec<L>) -> Result<Self, Self::Error> {
        Self::try_from_iter(value)
    }
}

impl TryFrom<&[L]> for Logits {
    type Error = LogitsError;

    fn try_from(value: &[L]) -> Result<Self, Self::Error> {
        Self::try_from_iter(value.iter().copied())
    }
}

impl Logits {
    /// Get the sorted flag.
    pub fn get_sorted(&self) -> bool {
        self.sorted
    }

    /// Set the sorted flag.
    pub fn set_sorted(&mut self, is_sorted: bool) -> &mut Self {
        self.sorted = is_sorted;
        self
    }

    /// Whether the `prob` fields currently hold a distribution.
    pub fn get_has_probs(&self) -> bool {
        self.has_probs
    }

    /// Mark the `prob` fields stale (or fresh). Samplers that rewrite the
    /// `logit` values must clear this.
    pub fn set_has_probs(&mut self, has_probs: bool) -> &mut Self {
        self.has_probs = has_probs;
        self
    }

    /// Ensure the [Logits] are sorted in descending order. Generally not necessary to call this directly.
    pub fn ensure_sorted(&mut self) -> Result<&mut Self, LogitsError> {
        if self.get_sorted() {
            return Ok(self);
        }

        let mut sort_err = Ok(());
        self.logits.as_mut_slice().sort_by(|a, b| {
            b.logit.partial_cmp(&a.logit).unwrap_or_else(|| {
                sort_err = Err(LogitsError::InternalError(String::from(
                    "Impossible: logit comparison failed?",
                )));
                std::cmp::Ordering::Less
            })
        });
        sort_err?;
        self.set_sorted(true);
        Ok(self)
    }

    /// Applies the softmax function to the [Logits]. Sorts first, so
    /// afterwards the probabilities are in descending order.
    pub fn softmax(&mut self) -> Result<&mut Self, SamplerError> {
        if self.is_empty() {
            return Err(SamplerError::SamplingFailure(
                "cannot take softmax of an empty vocabulary".to_string(),
            ));
        }
        self.ensure_sorted()?;
        let max_l = self[0].logit;
        if !max_l.is_finite() {
            return Err(SamplerError::SamplingFailure(format!(
                "maximum logit is {max_l}"
            )));
        }
        let cum_sum = self.iter_mut().fold(0f32, |cs, l| {
            let p = (l.logit - max_l).exp();
            l.prob = p;
            cs + p
        });
        self.iter_mut().for_each(|l| l.prob /= cum_sum);
        self.set_has_probs(true);
        Ok(self)
    }

    /// Applies softmax unless the probabilities are already current. Use
    /// this from filters so earlier zeroing isn't undone.
    pub fn ensure_softmax(&mut self) -> Result<&mut Self, SamplerError> {
        if self.get_has_probs() {
            return Ok(self);
        }
        self.softmax()
    }

    /// Scales the surviving probabilities so they sum to 1.
    pub fn renormalize(&mut self) -> Result<&mut Self, SamplerError> {
        let total = self.iter().fold(0f32, |acc, l| acc + l.prob);
        if !(total > 0.0 && total.is_finite()) {
            return Err(SamplerError::SamplingFailure(format!(
                "filtered distribution has total mass {total}"
            )));
        }
        self.iter_mut().for_each(|l| l.prob /= total);
        Ok(self)
    }

    /// Convenience method
    pub fn sample<S: Sampler>(
        &mut self,
        res: &mut dyn HasSamplerResources,
        sampler: &mut S,
    ) -> Result<&mut Self, SamplerError> {
        sampler.sample(res, self)
    }

    /// Convenience method
    pub fn sample_token<S: Sampler>(
        &mut self,
        res: &mut dyn HasSamplerResources,
        sampler: &mut S,
    ) -> Result<Option<TID>, SamplerError> {
        sampler.sample_token(res, self)
    }
}

/// The main sampler trait.
pub trait Sampler: Debug + Send + Sync {
    /// Runs the [Sampler]. Depending on the type of [Sampler], this may produce a token id.
    fn sample<'a>(
        &mut self,
        res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError>;

    /// Returns the last sampled token id if available.
    ///
    /// A default implemenation is provided which simply returns [None].
    fn sampled_token_id(&self) -> Option<TID> {
        None
    }

    /// Run the sampler and return the last sampled token id if available.
    ///
    /// A default implementation is provided which just calls [Sampler::sample] followed by
    /// [Sampler::sampled_token_id()].
    fn sample_token(
        &mut self,
        res: &mut dyn HasSamplerResources,
        logits: &mut Logits,
    ) -> Result<Option<TID>, SamplerError> {
        let _ = self.sample(res, logits)?;
        Ok(self.sampled_token_id())
    }
}

impl Sampler for Box<dyn Sampler> {
    fn sampled_token_id(&self) -> Option<TID> {
        (**self).sampled_token_id()
    }

    fn sample_token(
        &mut self,
        res: &mut dyn HasSamplerResources,
        logits: &mut Logits,
    ) -> Result<Option<TID>, SamplerError> {
        (**self).sample_token(res, logits)
    }

    fn sample<'a>(
        &mut self,
        res: &mut dyn HasSamplerResources,
        logits: &'a mut Logits,
    ) -> Result<&'a mut Logits, SamplerError> {
        (**self).sample(res, logits)
    }
}

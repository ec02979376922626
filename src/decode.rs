use std::fmt::Debug;

use tracing::{debug, trace};

use crate::{
    model::{Model, Tokenizer},
    params::SamplingConfig,
    types::*,
};

/// Why a [Decode] stopped producing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The contained stop string showed up in the decoded text.
    StopString(String),
    /// `max_steps` tokens were generated.
    MaxSteps,
    /// A step failed; the error was the last item yielded.
    Error,
}

/// Per-decode bookkeeping. Owned by exactly one [Decode].
pub struct DecodeState<S> {
    token_ids: Vec<TID>,
    cached_state: Option<S>,
    step_count: usize,
}

impl<S> Default for DecodeState<S> {
    fn default() -> Self {
        Self {
            token_ids: vec![],
            cached_state: None,
            step_count: 0,
        }
    }
}

impl<S> Debug for DecodeState<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeState")
            .field("token_ids", &self.token_ids)
            .field("cached_state", &self.cached_state.is_some())
            .field("step_count", &self.step_count)
            .finish()
    }
}

impl<S> DecodeState<S> {
    /// Tokens generated so far (prompt excluded).
    pub fn token_ids(&self) -> &[TID] {
        &self.token_ids
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

/// Lazy token-by-token generation.
///
/// Each item is the *whole* text decoded so far, not just the newest piece.
/// The iterator ends after a stop string appears (that text is still
/// yielded), after `max_steps` items, or right after yielding an error.
/// Dropping it early is a valid way to cancel.
pub struct Decode<'a, M: Model, T> {
    model: &'a M,
    tokenizer: &'a T,
    prompt: Vec<TID>,
    chain: SamplerChain,
    resources: SimpleSamplerResources,
    stop_set: &'a [String],
    max_steps: usize,
    state: DecodeState<M::State>,
    finished: Option<StopReason>,
}

/// Starts a decode over `initial_token_ids`.
///
/// Parameters are checked here so a bad [SamplingConfig] or an empty prompt
/// fails before the model is ever called.
pub fn decode<'a, M: Model, T: Tokenizer>(
    initial_token_ids: Vec<TID>,
    model: &'a M,
    tokenizer: &'a T,
    sampling: &SamplingConfig,
    stop_set: &'a [String],
    max_steps: usize,
    resources: SimpleSamplerResources,
) -> Result<Decode<'a, M, T>, GenerateError> {
    sampling.validate()?;
    if initial_token_ids.is_empty() {
        return Err(GenerateError::InvalidParameter(
            "cannot decode from an empty prompt".to_string(),
        ));
    }
    if stop_set.iter().any(String::is_empty) {
        return Err(GenerateError::InvalidParameter(
            "stop strings must not be empty".to_string(),
        ));
    }
    debug!(
        prompt_tokens = initial_token_ids.len(),
        max_steps,
        ?sampling,
        "starting decode"
    );
    Ok(Decode {
        model,
        tokenizer,
        prompt: initial_token_ids,
        chain: sampling.build_chain(),
        resources,
        stop_set,
        max_steps,
        state: DecodeState::default(),
        finished: None,
    })
}

impl<'a, M: Model, T: Tokenizer> Decode<'a, M, T> {
    /// Set once the iterator has ended.
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.finished.as_ref()
    }

    pub fn state(&self) -> &DecodeState<M::State> {
        &self.state
    }

    fn step(&mut self) -> Result<String, GenerateError> {
        let cached = self.state.cached_state.take();
        let output = match self.state.token_ids.last() {
            None => self.model.forward(&std::mem::take(&mut self.prompt), cached),
            Some(&last) => self.model.forward(&[last], cached),
        }
        .map_err(GenerateError::Model)?;
        self.state.cached_state = Some(output.state);

        let mut logits = Logits::try_from(output.logits)?;
        let token_id = self
            .chain
            .sample_token(&mut self.resources, &mut logits)?
            .ok_or_else(|| {
                GenerateError::SamplingFailure(SamplerError::InternalError(
                    "sampler chain picked no token".to_string(),
                ))
            })?;
        self.state.token_ids.push(token_id);
        self.state.step_count += 1;
        trace!(step = self.state.step_count, token_id, "sampled token");

        self.tokenizer
            .decode(&self.state.token_ids)
            .map_err(GenerateError::Tokenizer)
    }

    fn finish(&mut self, reason: StopReason) {
        debug!(steps = self.state.step_count, ?reason, "decode finished");
        self.finished = Some(reason);
    }
}

impl<'a, M: Model, T: Tokenizer> Iterator for Decode<'a, M, T> {
    type Item = Result<String, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished.is_some() {
            return None;
        }
        if self.state.step_count >= self.max_steps {
            self.finish(StopReason::MaxSteps);
            return None;
        }
        match self.step() {
            Ok(text) => {
                if let Some(stop) = self.stop_set.iter().find(|s| text.contains(s.as_str())) {
                    let stop = stop.clone();
                    self.finish(StopReason::StopString(stop));
                }
                Some(Ok(text))
            }
            Err(err) => {
                self.finish(StopReason::Error);
                Some(Err(err))
            }
        }
    }
}

impl<'a, M: Model, T: Tokenizer> std::iter::FusedIterator for Decode<'a, M, T> {}

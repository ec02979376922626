use tracing::debug;

use crate::{
    context::{ConversationTurn, PromptTemplate},
    decode::{decode, Decode},
    model::{Model, Tokenizer},
    params::GenerationParams,
    types::*,
};

/// Answers a single question with no prior history using the default
/// template. The final decoded text is returned with stop markers removed.
pub fn generate_answer<M: Model, T: Tokenizer>(
    model: &M,
    tokenizer: &T,
    question: &str,
    params: &GenerationParams,
) -> Result<String, GenerateError> {
    Generator::new(model, tokenizer)
        .params(params.clone())
        .generate_answer(question)
}

/// Bundles the collaborators with a template and parameters.
///
/// `M` and `T` are usually references (`&MyModel`), but owning them works too.
/// Nothing is kept between calls; history is always passed in by the caller.
#[derive(Debug, Clone)]
pub struct Generator<M, T> {
    model: M,
    tokenizer: T,
    template: PromptTemplate,
    params: GenerationParams,
}

impl<M: Model, T: Tokenizer> Generator<M, T> {
    pub fn new(model: M, tokenizer: T) -> Self {
        Self {
            model,
            tokenizer,
            template: PromptTemplate::default(),
            params: GenerationParams::default(),
        }
    }

    pub fn template(mut self, val: PromptTemplate) -> Self {
        self.template = val;
        self
    }

    pub fn params(mut self, val: GenerationParams) -> Self {
        self.params = val;
        self
    }

    pub fn get_params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn get_template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Assembles the prompt and returns the running decode so the caller can
    /// stream partial text.
    pub fn stream(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<Decode<'_, M, T>, GenerateError> {
        let params = &self.params;
        params.validate()?;
        let prompt =
            self.template
                .assemble(&self.tokenizer, question, history, params.max_length)?;
        let window = prompt.context_window(params.max_context_length_tokens);
        if window.len() < prompt.token_ids().len() {
            debug!(
                prompt_tokens = prompt.token_ids().len(),
                window = window.len(),
                "truncating prompt to context window"
            );
        }
        decode(
            window.to_vec(),
            &self.model,
            &self.tokenizer,
            &params.sampling,
            &params.stop_set,
            params.max_steps,
            SimpleSamplerResources::new_seedable(params.seed),
        )
    }

    pub fn generate_answer(&self, question: &str) -> Result<String, GenerateError> {
        self.generate_answer_with_history(question, &[])
    }

    /// Runs the decode to completion and cleans up the last text it produced.
    pub fn generate_answer_with_history(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<String, GenerateError> {
        let mut last = String::new();
        for text in self.stream(question, history)? {
            last = text?;
        }
        Ok(clean_answer(&last, &self.params.stop_set))
    }
}

/// Strips speaker markers from a finished decode: markers at the start are
/// dropped, everything from the first remaining marker on is cut, and
/// surrounding whitespace is trimmed.
///
/// A leading fragment counts as a marker when it is the tail end of one and
/// at least two bytes long, so `"|AI|]Hi"` becomes `"Hi"`. A single leftover
/// byte such as `"]"` is kept since it is just as likely to be real text.
pub fn clean_answer(text: &str, stop_set: &[String]) -> String {
    let mut rest = text.trim_start();
    while let Some(len) = stop_set
        .iter()
        .filter_map(|s| leading_marker_len(rest, s))
        .max()
    {
        rest = rest[len..].trim_start();
    }
    let end = stop_set
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| rest.find(s.as_str()))
        .min()
        .unwrap_or(rest.len());
    rest[..end].trim_end().to_string()
}

/// Length of the longest piece of `text`'s start that is `marker` or a
/// suffix of it spanning at least two bytes.
fn leading_marker_len(text: &str, marker: &str) -> Option<usize> {
    marker
        .char_indices()
        .map(|(idx, _)| &marker[idx..])
        .find(|tail| tail.len() >= 2 && text.starts_with(tail))
        .map(str::len)
}

/// A running chat. Each answered question is appended as a new turn so the
/// next question sees it as history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    history: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Generates an answer and records the turn. Nothing is recorded when
    /// generation fails.
    pub fn ask<M: Model, T: Tokenizer>(
        &mut self,
        generator: &Generator<M, T>,
        question: &str,
    ) -> Result<String, GenerateError> {
        let answer = generator.generate_answer_with_history(question, &self.history)?;
        self.history
            .push(ConversationTurn::new(question, answer.clone()));
        Ok(answer)
    }
}

use std::borrow::Cow;

use tracing::debug;

use crate::{model::Tokenizer, types::*};

const BAIZE_PREAMBLE: &str = concat!(
    "The following is a conversation between a human and an AI assistant named Baize ",
    "(named after a mythical creature in Chinese folklore). Baize is an open-source AI ",
    "assistant developed by UCSD and Sun Yat-Sen University. The human and the AI assistant ",
    "take turns chatting. Human statements start with [|Human|] and AI assistant statements ",
    "start with [|AI|]. The AI assistant always provides responses in as much detail as ",
    "possible, and in Markdown format. The AI assistant always declines to engage with ",
    "topics, questions and instructions related to unethical, controversial, or sensitive ",
    "issues. Complete the transcript in exactly that format.\n[|Human|]Hello!\n[|AI|]Hi!"
);

/// One completed exchange. A slice of these in chronological order is the
/// conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    human: String,
    ai: String,
}

impl ConversationTurn {
    pub fn new(human: impl Into<String>, ai: impl Into<String>) -> Self {
        Self {
            human: human.into(),
            ai: ai.into(),
        }
    }

    pub fn human(&self) -> &str {
        &self.human
    }

    pub fn ai(&self) -> &str {
        &self.ai
    }
}

/// How prompts are laid out: a fixed preamble followed by turns, each turn
/// written as `"\n{human_marker}{human}\n{ai_marker}{ai}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    preamble: Cow<'static, str>,
    human_marker: Cow<'static, str>,
    ai_marker: Cow<'static, str>,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            preamble: Cow::Borrowed(BAIZE_PREAMBLE),
            human_marker: Cow::Borrowed("[|Human|]"),
            ai_marker: Cow::Borrowed("[|AI|]"),
        }
    }
}

impl PromptTemplate {
    pub fn new(
        preamble: impl Into<Cow<'static, str>>,
        human_marker: impl Into<Cow<'static, str>>,
        ai_marker: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            preamble: preamble.into(),
            human_marker: human_marker.into(),
            ai_marker: ai_marker.into(),
        }
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// The speaker markers, which double as the natural stop set.
    pub fn markers(&self) -> [&str; 2] {
        [&*self.human_marker, &*self.ai_marker]
    }

    pub fn serialize_turn(&self, turn: &ConversationTurn) -> String {
        format!(
            "\n{}{}\n{}{}",
            self.human_marker, turn.human, self.ai_marker, turn.ai
        )
    }

    /// The new utterance, left open for the assistant to answer.
    pub fn serialize_utterance(&self, text: &str) -> String {
        format!("\n{}{}\n{}", self.human_marker, text, self.ai_marker)
    }

    /// Packs as much recent history as fits into `max_length` tokens.
    ///
    /// History is walked newest first and each turn is kept only while the
    /// whole prompt still fits. The walk stops at the first turn that doesn't
    /// fit, so no older turn is considered after that even if it is short.
    pub fn assemble<T: Tokenizer + ?Sized>(
        &self,
        tokenizer: &T,
        new_utterance: &str,
        history: &[ConversationTurn],
        max_length: usize,
    ) -> Result<Prompt, GenerateError> {
        if max_length == 0 {
            return Err(GenerateError::InvalidParameter(
                "max_length must be greater than zero".to_string(),
            ));
        }
        let count = |body: &str| {
            tokenizer
                .token_count(&format!("{}{body}", self.preamble))
                .map_err(GenerateError::Tokenizer)
        };

        let mut accumulated = self.serialize_utterance(new_utterance);
        let tokens = count(&accumulated)?;
        if tokens > max_length {
            return Err(GenerateError::PromptTooLong { tokens, max_length });
        }

        let mut included_turns = 0;
        for turn in history.iter().rev() {
            let candidate = self.serialize_turn(turn) + &accumulated;
            if count(&candidate)? > max_length {
                break;
            }
            accumulated = candidate;
            included_turns += 1;
        }

        let text = format!("{}{accumulated}", self.preamble);
        let token_ids = tokenizer.encode(&text).map_err(GenerateError::Tokenizer)?;
        debug!(
            included_turns,
            history_turns = history.len(),
            tokens = token_ids.len(),
            max_length,
            "assembled prompt"
        );
        Ok(Prompt {
            text,
            token_ids,
            included_turns,
        })
    }
}

/// [PromptTemplate::assemble] with the default template.
pub fn assemble<T: Tokenizer + ?Sized>(
    tokenizer: &T,
    new_utterance: &str,
    history: &[ConversationTurn],
    max_length: usize,
) -> Result<Prompt, GenerateError> {
    PromptTemplate::default().assemble(tokenizer, new_utterance, history, max_length)
}

/// An assembled prompt and its tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    token_ids: Vec<TID>,
    included_turns: usize,
}

impl Prompt {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn token_ids(&self) -> &[TID] {
        &self.token_ids
    }

    /// How many history turns made it into the prompt.
    pub fn included_turns(&self) -> usize {
        self.included_turns
    }

    /// The last `max_context_length_tokens` token ids: what the model
    /// actually gets to see.
    pub fn context_window(&self, max_context_length_tokens: usize) -> &[TID] {
        let start = self
            .token_ids
            .len()
            .saturating_sub(max_context_length_tokens);
        &self.token_ids[start..]
    }
}

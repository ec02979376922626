use std::cell::RefCell;

use anyhow::{anyhow, bail, Result};

use crate::prelude::*;

mod decode;
mod generate;

pub const T1: &[f32] = &[0.1, 0.2, 0.3, 0.4];
pub const TE1: &[f32] = &[0.4, 0.3, 0.2, 0.1];

/// Vocabulary size of [CharTokenizer]: one token per ASCII code point.
pub const VOCAB: usize = 128;

/// One token per ASCII character.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TID>> {
        text.chars()
            .map(|c| {
                if c.is_ascii() {
                    Ok(c as TID)
                } else {
                    Err(anyhow!("character {c:?} not in vocabulary"))
                }
            })
            .collect()
    }

    fn decode(&self, token_ids: &[TID]) -> Result<String> {
        token_ids
            .iter()
            .map(|&tid| {
                char::from_u32(tid)
                    .filter(char::is_ascii)
                    .ok_or_else(|| anyhow!("token {tid} not in vocabulary"))
            })
            .collect()
    }
}

/// Cached state handed around by [ScriptedModel]: the number of calls so far.
#[derive(Debug, PartialEq, Eq)]
pub struct ScriptState(usize);

/// Emits `script` one character per call as a one-hot logit vector, and
/// records what it was called with.
#[derive(Debug)]
pub struct ScriptedModel {
    script: Vec<TID>,
    fail_at: Option<usize>,
    degenerate_at: Option<usize>,
    pub calls: RefCell<Vec<(Vec<TID>, bool)>>,
}

impl ScriptedModel {
    pub fn new(script: &str) -> Self {
        Self {
            script: script.chars().map(|c| c as TID).collect(),
            fail_at: None,
            degenerate_at: None,
            calls: RefCell::new(vec![]),
        }
    }

    pub fn fail_at(mut self, step: usize) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn degenerate_at(mut self, step: usize) -> Self {
        self.degenerate_at = Some(step);
        self
    }
}

impl Model for ScriptedModel {
    type State = ScriptState;

    fn forward(
        &self,
        token_ids: &[TID],
        state: Option<ScriptState>,
    ) -> Result<ModelOutput<ScriptState>> {
        let step = self.calls.borrow().len();
        self.calls
            .borrow_mut()
            .push((token_ids.to_vec(), state.is_some()));
        match state {
            None if step != 0 => bail!("missing cached state at step {step}"),
            Some(ScriptState(n)) if n != step => bail!("stale cached state {n} at step {step}"),
            _ => (),
        }
        if self.fail_at == Some(step) {
            bail!("device lost at step {step}");
        }
        let mut logits = vec![f32::NEG_INFINITY; VOCAB];
        if self.degenerate_at != Some(step) {
            let tid = *self
                .script
                .get(step)
                .ok_or_else(|| anyhow!("script exhausted at step {step}"))?;
            logits[tid as usize] = 0.0;
        }
        Ok(ModelOutput {
            logits,
            state: ScriptState(step + 1),
        })
    }
}

#[test]
fn test_char_tokenizer_round_trip() -> Result<()> {
    let tok = CharTokenizer;
    for text in ["", "Hi there![|Human|]", "line\nbreak\tand tab"] {
        assert_eq!(tok.decode(&tok.encode(text)?)?, text);
        assert_eq!(tok.token_count(text)?, text.len());
    }
    assert!(tok.encode("é").is_err());
    Ok(())
}

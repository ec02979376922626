use anyhow::Result;

use crate::types::{L, TID};

/// What a single forward pass hands back to the decode loop.
#[derive(Debug)]
pub struct ModelOutput<S> {
    /// Logits for the final position only, one per vocabulary entry.
    pub logits: Vec<L>,
    /// Cached state to pass to the next call.
    pub state: S,
}

/// A causal language model that can evaluate incrementally.
///
/// The first call of a decode gets the whole prompt and no state. Every later
/// call gets just the newest token along with the state the previous call
/// returned. Implementations must support both shapes.
pub trait Model {
    /// Model specific cached state (attention history and similar). The decode
    /// loop only moves it around, it is never cloned or inspected.
    type State;

    fn forward(
        &self,
        token_ids: &[TID],
        state: Option<Self::State>,
    ) -> Result<ModelOutput<Self::State>>;
}

impl<M: Model + ?Sized> Model for &M {
    type State = M::State;

    fn forward(
        &self,
        token_ids: &[TID],
        state: Option<Self::State>,
    ) -> Result<ModelOutput<Self::State>> {
        (**self).forward(token_ids, state)
    }
}

/// Maps text to token ids and back.
///
/// `decode(encode(x)) == x` is expected to hold; the decode loop relies on it
/// when checking for stop strings.
pub trait Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<TID>>;

    fn decode(&self, token_ids: &[TID]) -> Result<String>;

    /// Number of tokens `text` encodes to.
    fn token_count(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn encode(&self, text: &str) -> Result<Vec<TID>> {
        (**self).encode(text)
    }

    fn decode(&self, token_ids: &[TID]) -> Result<String> {
        (**self).decode(token_ids)
    }

    fn token_count(&self, text: &str) -> Result<usize> {
        (**self).token_count(text)
    }
}

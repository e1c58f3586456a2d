// WHY: the pipeline only needs "text in, tokens with chunk-local offsets out",
// so the remote parser sits behind a trait that tests can fake

use serde::{Deserialize, Serialize};

/// Identity of a distinct word: vocabulary id plus spelling id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VocabularyKey {
    pub vid: u64,
    pub sid: u64,
}

impl VocabularyKey {
    pub fn new(vid: u64, sid: u64) -> Self {
        Self { vid, sid }
    }
}

/// Study status the service attaches to a word
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardState {
    /// No card exists for the word in any of the user's decks
    #[default]
    Untracked,
    /// The service's state labels, e.g. `["known"]` or `["learning", "due"]`
    Tracked(Vec<String>),
}

impl CardState {
    pub fn from_labels(labels: Option<Vec<String>>) -> Self {
        match labels {
            Some(labels) => CardState::Tracked(labels),
            None => CardState::Untracked,
        }
    }

    pub fn is_untracked(&self) -> bool {
        matches!(self, CardState::Untracked)
    }
}

/// Display form of a word; not part of its identity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WordLabel {
    pub spelling: String,
    pub reading: String,
}

/// A token as reported for one chunk, offsets relative to that chunk's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    pub local_start: usize,
    pub local_end: usize,
    pub key: VocabularyKey,
    pub card_state: CardState,
    pub label: WordLabel,
}

/// A remote or local parser that tokenizes one chunk of text.
///
/// Offsets must be character offsets into `text`, end exclusive. Tokens need not be sorted.
#[allow(async_fn_in_trait)]
pub trait Tokenizer {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn parse_chunk(&self, text: &str) -> Result<Vec<RawToken>, Self::Error>;
}

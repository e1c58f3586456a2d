// WHY: request/response shapes of the jpdb.io JSON API, kept free of I/O so
// decoding can be tested against captured payloads

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::JpdbError;
use crate::tokenizer::{CardState, RawToken, VocabularyKey, WordLabel};

pub const PARSE_ENDPOINT: &str = "/api/v1/parse";

/// Token columns requested from `/api/v1/parse`, in response order
pub const TOKEN_FIELDS: [&str; 3] = ["vocabulary_index", "position", "length"];

/// Vocabulary columns requested from `/api/v1/parse`, in response order
pub const VOCABULARY_FIELDS: [&str; 5] = ["vid", "sid", "spelling", "reading", "card_state"];

#[derive(Debug, Serialize)]
pub struct ParseRequest<'a> {
    pub text: &'a str,
    pub token_fields: [&'static str; 3],
    pub vocabulary_fields: [&'static str; 5],
    /// Positions counted in code points, matching Rust `char` offsets
    pub position_length_encoding: &'static str,
}

impl<'a> ParseRequest<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            token_fields: TOKEN_FIELDS,
            vocabulary_fields: VOCABULARY_FIELDS,
            position_length_encoding: "utf32",
        }
    }
}

/// `[vid, sid, spelling, reading, card_state]`; card_state is null when the user has no card
#[derive(Debug, Deserialize)]
pub struct VocabularyRow(pub u64, pub u64, pub String, pub String, pub Option<Vec<String>>);

#[derive(Debug, Deserialize)]
pub struct ParseResponse {
    /// `[vocabulary_index, position, length]` per token
    #[serde(default)]
    pub tokens: Vec<(usize, usize, usize)>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyRow>,
}

impl ParseResponse {
    /// Join tokens with their vocabulary rows; tokens pointing past the vocabulary list are dropped.
    ///
    /// A token whose end offset overflows is a malformed response, not something to clamp.
    pub fn into_raw_tokens(self) -> Result<Vec<RawToken>, JpdbError> {
        let vocabulary = self.vocabulary;
        let mut raw_tokens = Vec::with_capacity(self.tokens.len());

        for (vocab_index, position, length) in self.tokens {
            let Some(row) = vocabulary.get(vocab_index) else {
                debug!("Token at {} refers to missing vocabulary entry {}", position, vocab_index);
                continue;
            };

            let local_end = position.checked_add(length).ok_or_else(|| JpdbError::Decode {
                endpoint: PARSE_ENDPOINT.to_string(),
                reason: format!("token at {position} with length {length} overflows"),
            })?;

            raw_tokens.push(RawToken {
                local_start: position,
                local_end,
                key: VocabularyKey::new(row.0, row.1),
                card_state: CardState::from_labels(row.4.clone()),
                label: WordLabel { spelling: row.2.clone(), reading: row.3.clone() },
            });
        }

        Ok(raw_tokens)
    }
}

#[derive(Debug, Serialize)]
pub struct CreateDeckRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateDeckResponse {
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct AddVocabularyRequest {
    pub id: u64,
    pub vocabulary: Vec<[u64; 2]>,
}

impl AddVocabularyRequest {
    pub fn new(deck_id: u64, keys: &[VocabularyKey]) -> Self {
        Self {
            id: deck_id,
            vocabulary: keys.iter().map(|k| [k.vid, k.sid]).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SetCardSentenceRequest<'a> {
    pub vid: u64,
    pub sid: u64,
    pub sentence: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_message: Option<String>,
}

/// Prefer the API's `error_message` field, fall back to the raw body
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error_message)
        .unwrap_or_else(|| body.to_string())
}

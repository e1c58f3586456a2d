// WHY: each chunk is tokenized in isolation, so its offsets are rebased onto the
// document before tokens from different chunks can be compared

use tracing::debug;

use crate::chunk_planner::Chunk;
use crate::error::{PipelineError, PipelineResult};
use crate::tokenizer::{CardState, RawToken, VocabularyKey, WordLabel};

/// A token positioned in global document character offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalToken {
    pub start: usize,
    pub end: usize,
    pub key: VocabularyKey,
    pub card_state: CardState,
    pub label: WordLabel,
}

/// Rebase one chunk's tokens, rejecting offsets outside the chunk text
pub fn reconcile(chunk: &Chunk, raw_tokens: &[RawToken]) -> PipelineResult<Vec<GlobalToken>> {
    let chunk_len = chunk.len();

    raw_tokens
        .iter()
        .map(|token| {
            if token.local_start >= token.local_end || token.local_end > chunk_len {
                return Err(PipelineError::TokenOffsetOutOfRange {
                    chunk_index: chunk.index,
                    local_start: token.local_start,
                    local_end: token.local_end,
                    chunk_len,
                });
            }

            Ok(GlobalToken {
                start: chunk.start + token.local_start,
                end: chunk.start + token.local_end,
                key: token.key,
                card_state: token.card_state.clone(),
                label: token.label.clone(),
            })
        })
        .collect()
}

/// Rebase every chunk and concatenate in document order, whatever order results arrived in.
///
/// Any out-of-range token aborts the whole document.
pub fn reconcile_all(mut results: Vec<(Chunk, Vec<RawToken>)>) -> PipelineResult<Vec<GlobalToken>> {
    results.sort_by_key(|(chunk, _)| chunk.start);

    let mut tokens = Vec::with_capacity(results.iter().map(|(_, raw)| raw.len()).sum());
    for (chunk, raw_tokens) in &results {
        let rebased = reconcile(chunk, raw_tokens)?;
        debug!("Chunk {} contributed {} tokens", chunk.index, rebased.len());
        tokens.extend(rebased);
    }

    Ok(tokens)
}

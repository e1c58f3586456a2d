// WHY: every distinct word gets exactly one example sentence, chosen by position
// alone so the result does not depend on which chunk reported it first

use std::collections::HashMap;

use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::reconciler::GlobalToken;
use crate::sentence_splitter::SentenceSpan;
use crate::tokenizer::{CardState, VocabularyKey, WordLabel};

/// The sentence chosen for one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSentenceAssignment {
    pub key: VocabularyKey,
    pub sentence: SentenceSpan,
    pub first_token_start: usize,
    pub card_state: CardState,
    pub label: WordLabel,
}

/// Assign each vocabulary key the sentence holding its earliest occurrence.
///
/// On equal positions the token earlier in `tokens` wins. Assignments come back in
/// order of first occurrence.
pub fn map(tokens: &[GlobalToken], sentences: &[SentenceSpan]) -> PipelineResult<Vec<WordSentenceAssignment>> {
    // key -> index into `tokens` of its earliest occurrence
    let mut first: HashMap<VocabularyKey, usize> = HashMap::new();

    for (i, token) in tokens.iter().enumerate() {
        first
            .entry(token.key)
            .and_modify(|best| {
                if token.start < tokens[*best].start {
                    *best = i;
                }
            })
            .or_insert(i);
    }

    let mut chosen: Vec<usize> = first.into_values().collect();
    chosen.sort_by_key(|&i| (tokens[i].start, i));

    let assignments = chosen
        .into_iter()
        .map(|i| {
            let token = &tokens[i];
            let sentence = locate_sentence(sentences, token.start)?;
            Ok(WordSentenceAssignment {
                key: token.key,
                sentence: sentence.clone(),
                first_token_start: token.start,
                card_state: token.card_state.clone(),
                label: token.label.clone(),
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    info!("Mapped {} tokens to {} distinct words", tokens.len(), assignments.len());
    Ok(assignments)
}

/// Binary search for the span containing `position`; spans must be sorted and contiguous
pub fn locate_sentence(sentences: &[SentenceSpan], position: usize) -> PipelineResult<&SentenceSpan> {
    let candidate = sentences.partition_point(|s| s.end <= position);

    match sentences.get(candidate) {
        Some(sentence) if sentence.contains(position) => Ok(sentence),
        _ => Err(PipelineError::PositionOutOfRange {
            position,
            document_len: sentences.last().map_or(0, |s| s.end),
        }),
    }
}

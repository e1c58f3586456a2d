// WHY: parse requests have an undocumented length cap, so the document is sent in
// sentence-aligned pieces whose offsets can be rebased afterwards

use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::sentence_splitter::SentenceSpan;

/// Conservative per-request character limit; the service starts rejecting somewhere past 5,500
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5000;

/// A contiguous, sentence-aligned slice of the document submitted as one parse request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    /// Global character offset of the first character
    pub start: usize,
    /// Global character offset one past the last character
    pub end: usize,
    pub text: String,
}

impl Chunk {
    /// Length in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Greedily pack whole sentences into chunks of at most `max_size` characters.
///
/// A sentence longer than `max_size` becomes a chunk of its own; it is never split.
pub fn plan(document: &str, sentences: &[SentenceSpan], max_size: usize) -> PipelineResult<Vec<Chunk>> {
    if max_size == 0 {
        return Err(PipelineError::InvalidChunkPlan(
            "max chunk size must be positive".to_string(),
        ));
    }
    check_coverage(document, sentences)?;

    let mut chunks = Vec::new();
    let mut current: Option<(usize, usize, String)> = None;

    for sentence in sentences {
        current = match current.take() {
            Some((start, end, mut text)) if end - start + sentence.len() <= max_size => {
                text.push_str(&sentence.text);
                Some((start, sentence.end, text))
            }
            Some(open) => {
                push_chunk(&mut chunks, open, max_size);
                Some((sentence.start, sentence.end, sentence.text.clone()))
            }
            None => Some((sentence.start, sentence.end, sentence.text.clone())),
        };
    }

    if let Some(open) = current {
        push_chunk(&mut chunks, open, max_size);
    }

    info!("Planned {} chunks (max {} chars each)", chunks.len(), max_size);
    Ok(chunks)
}

fn push_chunk(chunks: &mut Vec<Chunk>, (start, end, text): (usize, usize, String), max_size: usize) {
    let chunk = Chunk { index: chunks.len(), start, end, text };

    if chunk.len() > max_size {
        warn!(
            "Chunk {} holds a single {}-character sentence, over the {} limit",
            chunk.index,
            chunk.len(),
            max_size
        );
    } else {
        debug!("Chunk {}: [{}, {})", chunk.index, chunk.start, chunk.end);
    }

    chunks.push(chunk);
}

/// Spans must tile `[0, document length)` in order, or rebased offsets would drift
fn check_coverage(document: &str, sentences: &[SentenceSpan]) -> PipelineResult<()> {
    let mut expected_start = 0;

    for sentence in sentences {
        if sentence.start != expected_start || sentence.end < sentence.start {
            return Err(PipelineError::InvalidChunkPlan(format!(
                "sentence {} spans [{}, {}) but the previous sentence ended at {}",
                sentence.index, sentence.start, sentence.end, expected_start
            )));
        }
        expected_start = sentence.end;
    }

    let document_len = document.chars().count();
    if expected_start != document_len {
        return Err(PipelineError::InvalidChunkPlan(format!(
            "sentences cover {expected_start} of {document_len} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence_splitter::SentenceSplitter;

    const DOC: &str = "今日は天気がいいね。明日も晴れるといいな。";

    fn spans(text: &str) -> Vec<SentenceSpan> {
        SentenceSplitter::with_default_rules().unwrap().split(text)
    }

    #[test]
    fn test_chunks_follow_sentences_when_both_do_not_fit() {
        let chunks = plan(DOC, &spans(DOC), 12).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 10));
        assert_eq!(chunks[0].text, "今日は天気がいいね。");
        assert_eq!((chunks[1].start, chunks[1].end), (10, 21));
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn test_whole_document_fits_in_one_chunk() {
        let chunks = plan(DOC, &spans(DOC), 5000).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, DOC);
        assert_eq!(chunks[0].len(), 21);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let chunks = plan(DOC, &spans(DOC), 21).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_oversized_sentence_becomes_own_chunk() {
        let chunks = plan(DOC, &spans(DOC), 5).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 11);
    }

    #[test]
    fn test_greedy_packing() {
        let text = "あ。い。う。え。お。";
        let chunks = plan(text, &spans(text), 4).unwrap();
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["あ。い。", "う。え。", "お。"]);

        let rebuilt: String = texts.concat();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_chunk_boundaries_are_sentence_boundaries() {
        let text = "短い。少し長めの文です。とても長い文がここにあります。終わり";
        let sentences = spans(text);
        let chunks = plan(text, &sentences, 8).unwrap();

        let boundaries: Vec<usize> = sentences.iter().map(|s| s.start).collect();
        for chunk in &chunks {
            assert!(boundaries.contains(&chunk.start));
            assert!(chunk.len() <= 8 || sentences.iter().any(|s| s.start == chunk.start && s.end == chunk.end));
        }
        assert_eq!(chunks.last().unwrap().end, text.chars().count());
    }

    #[test]
    fn test_empty_document_has_no_chunks() {
        assert!(plan("", &[], 10).unwrap().is_empty());
    }

    #[test]
    fn test_zero_max_size_is_rejected() {
        let err = plan(DOC, &spans(DOC), 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidChunkPlan(_)));
    }

    #[test]
    fn test_gapped_sentences_are_rejected() {
        let mut sentences = spans(DOC);
        sentences.remove(0);
        assert!(matches!(plan(DOC, &sentences, 50), Err(PipelineError::InvalidChunkPlan(_))));

        let sentences = spans("今日は天気がいいね。");
        assert!(matches!(plan(DOC, &sentences, 50), Err(PipelineError::InvalidChunkPlan(_))));
    }
}

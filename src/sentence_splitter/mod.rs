// WHY: Sentence splitting for Japanese text with full document coverage
// Every character belongs to exactly one span so later offset math never hits a gap

use anyhow::{bail, Result};
use regex_automata::meta::Regex;
use tracing::{debug, info};

pub mod normalization;

pub use normalization::{normalize_sentence, normalize_sentence_into};

/// Configuration for sentence boundary rules
#[derive(Debug, Clone)]
pub struct SplitterRules {
    /// Characters that close the current sentence
    pub terminators: Vec<char>,
    /// Closing quotes and brackets absorbed into a sentence when they follow a terminator
    pub closers: Vec<char>,
}

impl Default for SplitterRules {
    fn default() -> Self {
        Self {
            terminators: vec!['。', '！', '？', '\n'],
            closers: vec!['」', '』', '）', ')', '】', '〉', '》', '"', '\u{201D}', '\u{2019}'],
        }
    }
}

/// A sentence as a half-open character range `[start, end)` of the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl SentenceSpan {
    /// Length in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }

    /// Card-ready form of the sentence (trimmed, whitespace runs collapsed)
    pub fn normalized(&self) -> String {
        normalize_sentence(&self.text)
    }

    /// Normalize into a supplied buffer (no allocation when the buffer is reused)
    pub fn normalize_into(&self, buffer: &mut String) {
        normalize_sentence_into(&self.text, buffer);
    }
}

/// Tracks the character offset that corresponds to a byte offset while scanning forward
struct CharCounter {
    byte_pos: usize,
    char_pos: usize,
}

impl CharCounter {
    fn new() -> Self {
        Self { byte_pos: 0, char_pos: 0 }
    }

    /// Advance to `target_byte_pos`, which must lie on a char boundary at or after the current position
    fn advance_to_byte(&mut self, text: &str, target_byte_pos: usize) {
        self.char_pos += text[self.byte_pos..target_byte_pos].chars().count();
        self.byte_pos = target_byte_pos;
    }
}

/// Splits documents into contiguous sentence spans
pub struct SentenceSplitter {
    rules: SplitterRules,
    boundary: Regex,
}

impl SentenceSplitter {
    /// Compile the boundary pattern `[terminators][terminators closers]*` from the rules
    pub fn new(rules: SplitterRules) -> Result<Self> {
        if rules.terminators.is_empty() {
            bail!("sentence splitter needs at least one terminator character");
        }

        let terminator_class = char_class(rules.terminators.iter());
        let run_class = char_class(rules.terminators.iter().chain(rules.closers.iter()));
        let pattern = format!("[{terminator_class}][{run_class}]*");
        let boundary = Regex::new(&pattern)?;

        debug!("Compiled sentence boundary pattern: {}", pattern);
        Ok(Self { rules, boundary })
    }

    pub fn with_default_rules() -> Result<Self> {
        Self::new(SplitterRules::default())
    }

    pub fn rules(&self) -> &SplitterRules {
        &self.rules
    }

    /// Split `document` into spans whose texts concatenate back to the document
    pub fn split(&self, document: &str) -> Vec<SentenceSpan> {
        let mut spans = Vec::new();
        let mut counter = CharCounter::new();

        for boundary in self.boundary.find_iter(document) {
            let start_byte = counter.byte_pos;
            let start = counter.char_pos;
            counter.advance_to_byte(document, boundary.end());

            spans.push(SentenceSpan {
                index: spans.len(),
                start,
                end: counter.char_pos,
                text: document[start_byte..boundary.end()].to_string(),
            });
        }

        // Trailing text without a terminator is still a sentence
        if counter.byte_pos < document.len() {
            let start_byte = counter.byte_pos;
            let start = counter.char_pos;
            counter.advance_to_byte(document, document.len());

            spans.push(SentenceSpan {
                index: spans.len(),
                start,
                end: counter.char_pos,
                text: document[start_byte..].to_string(),
            });
        }

        info!("Split {} characters into {} sentences", counter.char_pos, spans.len());
        spans
    }
}

/// Convenience wrapper using the default Japanese rule set
pub fn split_sentences(document: &str) -> Result<Vec<SentenceSpan>> {
    Ok(SentenceSplitter::with_default_rules()?.split(document))
}

fn char_class<'a>(chars: impl Iterator<Item = &'a char>) -> String {
    chars.map(|c| format!("\\x{{{:X}}}", *c as u32)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str) -> Vec<SentenceSpan> {
        SentenceSplitter::with_default_rules().unwrap().split(text)
    }

    fn texts(spans: &[SentenceSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_two_sentences_with_char_offsets() {
        let spans = split("今日は天気がいいね。明日も晴れるといいな。");
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 10));
        assert_eq!((spans[1].start, spans[1].end), (10, 21));
        assert_eq!(spans[0].text, "今日は天気がいいね。");
        assert_eq!(spans[1].text, "明日も晴れるといいな。");
    }

    #[test]
    fn test_terminator_runs_are_absorbed() {
        let spans = split("本当？！うそ。。。\n\nまた明日");
        assert_eq!(texts(&spans), vec!["本当？！", "うそ。。。\n\n", "また明日"]);
    }

    #[test]
    fn test_closing_quotes_stay_with_their_sentence() {
        let spans = split("「おはよう。」と言った。");
        assert_eq!(texts(&spans), vec!["「おはよう。」", "と言った。"]);

        let spans = split("（そうだ！）次へ。");
        assert_eq!(texts(&spans), vec!["（そうだ！）", "次へ。"]);
    }

    #[test]
    fn test_terminator_at_document_start() {
        let spans = split("。始まり");
        assert_eq!(texts(&spans), vec!["。", "始まり"]);
        assert_eq!(spans[1].start, 1);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(split("").is_empty());

        let spans = split("   ");
        assert_eq!(texts(&spans), vec!["   "]);

        let spans = split(" \n \t");
        assert_eq!(texts(&spans), vec![" \n", " \t"]);
    }

    #[test]
    fn test_spans_cover_document() {
        let text = "一行目\n二行目。「引用！」\r\n三行目？ 最後";
        let spans = split(text);
        let rebuilt: String = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(rebuilt, text);

        let mut expected_start = 0;
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.index, i);
            assert_eq!(span.start, expected_start);
            assert_eq!(span.len(), span.text.chars().count());
            expected_start = span.end;
        }
        assert_eq!(expected_start, text.chars().count());
    }

    #[test]
    fn test_edge_inputs_are_fully_covered() {
        let cases: &[(&str, &[&str])] = &[
            ("。。。", &["。。。"]),
            ("」」", &["」」"]),
            ("」。x", &["」。", "x"]),
            ("\n先頭の行", &["\n", "先頭の行"]),
            ("\r\n\r\n", &["\r\n", "\r\n"]),
            ("終わりのない文", &["終わりのない文"]),
        ];

        for (input, expected) in cases {
            let spans = split(input);
            assert_eq!(texts(&spans), *expected, "input {input:?}");

            let mut expected_start = 0;
            for span in &spans {
                assert_eq!(span.start, expected_start, "input {input:?}");
                assert!(span.end > span.start, "input {input:?}");
                expected_start = span.end;
            }
            assert_eq!(expected_start, input.chars().count(), "input {input:?}");
        }
    }

    #[test]
    fn test_custom_rules() {
        let rules = SplitterRules { terminators: vec!['.'], closers: vec![] };
        let splitter = SentenceSplitter::new(rules).unwrap();
        let spans = splitter.split("One. Two.. Three");
        assert_eq!(texts(&spans), vec!["One.", " Two..", " Three"]);
    }

    #[test]
    fn test_rules_without_terminators_are_rejected() {
        let rules = SplitterRules { terminators: vec![], closers: vec!['」'] };
        assert!(SentenceSplitter::new(rules).is_err());
    }

    #[test]
    fn test_char_counter_tracks_multibyte() {
        let text = "日本a語";
        let mut counter = CharCounter::new();
        counter.advance_to_byte(text, 6);
        assert_eq!(counter.char_pos, 2);
        counter.advance_to_byte(text, text.len());
        assert_eq!(counter.char_pos, 4);
    }
}

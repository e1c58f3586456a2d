// Integration test utilities and common code
// WHY: Centralized fakes avoid duplication across integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use jpdb_sentences::{CardState, DeckService, RawToken, Tokenizer, VocabularyKey, WordLabel};

#[derive(Debug, thiserror::Error)]
#[error("fake service failure: {0}")]
pub struct FakeError(pub String);

/// One dictionary entry for [`DictionaryTokenizer`]
#[derive(Debug, Clone)]
pub struct Entry {
    pub surface: &'static str,
    pub key: VocabularyKey,
    pub card_state: CardState,
}

pub fn entry(surface: &'static str, vid: u64) -> Entry {
    Entry { surface, key: VocabularyKey::new(vid, 0), card_state: CardState::Untracked }
}

pub fn known_entry(surface: &'static str, vid: u64) -> Entry {
    Entry {
        surface,
        key: VocabularyKey::new(vid, 0),
        card_state: CardState::Tracked(vec!["known".to_string()]),
    }
}

/// Stands in for the remote parser: reports every occurrence of every dictionary surface
pub struct DictionaryTokenizer {
    entries: Vec<Entry>,
    /// Chunk texts containing this marker fail
    fail_marker: Option<&'static str>,
    /// Chunk texts containing this marker answer late
    slow_marker: Option<&'static str>,
    pub requests: Mutex<Vec<String>>,
    pub request_times: Mutex<Vec<Instant>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl DictionaryTokenizer {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            fail_marker: None,
            slow_marker: None,
            requests: Mutex::new(Vec::new()),
            request_times: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, marker: &'static str) -> Self {
        self.fail_marker = Some(marker);
        self
    }

    pub fn slow_on(mut self, marker: &'static str) -> Self {
        self.slow_marker = Some(marker);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn scan(&self, text: &str) -> Vec<RawToken> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();

        for entry in &self.entries {
            let needle: Vec<char> = entry.surface.chars().collect();
            for start in 0..chars.len() {
                if chars[start..].starts_with(&needle) {
                    tokens.push(RawToken {
                        local_start: start,
                        local_end: start + needle.len(),
                        key: entry.key,
                        card_state: entry.card_state.clone(),
                        label: WordLabel { spelling: entry.surface.to_string(), reading: String::new() },
                    });
                }
            }
        }

        tokens
    }
}

impl Tokenizer for DictionaryTokenizer {
    type Error = FakeError;

    async fn parse_chunk(&self, text: &str) -> Result<Vec<RawToken>, FakeError> {
        self.requests.lock().unwrap().push(text.to_string());
        self.request_times.lock().unwrap().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.slow_marker.is_some_and(|m| text.contains(m)) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_marker.is_some_and(|m| text.contains(m)) {
            return Err(FakeError(format!("rejected chunk of {} chars", text.chars().count())));
        }
        Ok(self.scan(text))
    }
}

/// Records deck calls; fails sentence updates for the listed vocabulary ids
#[derive(Default)]
pub struct RecordingDeckService {
    pub fail_sentence_for: Vec<u64>,
    pub fail_create: bool,
    pub created: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<Vec<VocabularyKey>>>,
    pub sentences: Mutex<Vec<(VocabularyKey, String)>>,
}

impl DeckService for RecordingDeckService {
    type Error = FakeError;

    async fn create_deck(&self, name: &str) -> Result<u64, FakeError> {
        if self.fail_create {
            return Err(FakeError("deck limit reached".to_string()));
        }
        self.created.lock().unwrap().push(name.to_string());
        Ok(42)
    }

    async fn add_vocabulary(&self, _deck_id: u64, keys: &[VocabularyKey]) -> Result<(), FakeError> {
        self.batches.lock().unwrap().push(keys.to_vec());
        Ok(())
    }

    async fn set_card_sentence(&self, key: VocabularyKey, sentence: &str) -> Result<(), FakeError> {
        if self.fail_sentence_for.contains(&key.vid) {
            return Err(FakeError(format!("cannot set sentence for {}", key.vid)));
        }
        self.sentences.lock().unwrap().push((key, sentence.to_string()));
        Ok(())
    }
}

// WHY: deck creation is the consumer of the word-to-sentence mapping; it goes
// through a trait so the whole workflow runs against an in-memory service in tests

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::mapper::WordSentenceAssignment;
use crate::tokenizer::VocabularyKey;

/// Remote deck operations needed to build a deck from assignments
#[allow(async_fn_in_trait)]
pub trait DeckService {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn create_deck(&self, name: &str) -> Result<u64, Self::Error>;

    async fn add_vocabulary(&self, deck_id: u64, keys: &[VocabularyKey]) -> Result<(), Self::Error>;

    async fn set_card_sentence(&self, key: VocabularyKey, sentence: &str) -> Result<(), Self::Error>;
}

/// Configuration for deck building behavior
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// Set sentences for every word, not only words without a card
    pub all_words: bool,
    /// Vocabulary entries per add-vocabulary request
    pub batch_size: usize,
    /// Pause after this many sentence updates
    pub pause_every: usize,
    pub pause: Duration,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            all_words: false,
            batch_size: 100,
            pause_every: 10,
            pause: Duration::from_millis(500),
        }
    }
}

/// Outcome of a deck build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckReport {
    pub deck_id: u64,
    pub deck_name: String,
    pub vocabulary_added: usize,
    pub sentences_set: usize,
    /// Selected words whose sentence was blank after normalization
    pub sentences_skipped: usize,
    pub errors: usize,
}

/// Words that should get a custom sentence, in first-occurrence order
pub fn select_words(assignments: &[WordSentenceAssignment], all_words: bool) -> Vec<&WordSentenceAssignment> {
    assignments
        .iter()
        .filter(|a| all_words || a.card_state.is_untracked())
        .collect()
}

/// Create `deck_name`, add every mapped word to it and set sentences for the selected words.
///
/// Failing to create the deck or add vocabulary aborts; a failed sentence update is counted and skipped.
pub async fn build_deck<D: DeckService>(
    service: &D,
    deck_name: &str,
    assignments: &[WordSentenceAssignment],
    config: &DeckConfig,
    progress: &ProgressBar,
) -> Result<DeckReport> {
    let deck_id = service
        .create_deck(deck_name)
        .await
        .with_context(|| format!("creating deck {deck_name:?}"))?;
    info!("Created deck {} with id {}", deck_name, deck_id);

    let keys: Vec<VocabularyKey> = assignments.iter().map(|a| a.key).collect();
    let batch_size = config.batch_size.max(1);
    let batch_count = keys.len().div_ceil(batch_size);

    for (i, batch) in keys.chunks(batch_size).enumerate() {
        service
            .add_vocabulary(deck_id, batch)
            .await
            .with_context(|| format!("adding vocabulary batch {}/{}", i + 1, batch_count))?;
        debug!("Added batch {}/{}", i + 1, batch_count);
    }

    let selected = select_words(assignments, config.all_words);
    progress.set_length(selected.len() as u64);

    let mut report = DeckReport {
        deck_id,
        deck_name: deck_name.to_string(),
        vocabulary_added: keys.len(),
        ..DeckReport::default()
    };
    let mut buffer = String::new();

    for (i, assignment) in selected.iter().enumerate() {
        assignment.sentence.normalize_into(&mut buffer);
        let spelling = &assignment.label.spelling;

        if buffer.is_empty() {
            debug!("Skipping {}: sentence is blank", spelling);
            report.sentences_skipped += 1;
        } else {
            match service.set_card_sentence(assignment.key, &buffer).await {
                Ok(()) => {
                    report.sentences_set += 1;
                    debug!("[{}/{}] Set sentence for {}", i + 1, selected.len(), spelling);
                }
                Err(e) => {
                    report.errors += 1;
                    warn!("[{}/{}] Error setting sentence for {}: {}", i + 1, selected.len(), spelling, e);
                }
            }
        }
        progress.inc(1);

        if config.pause_every > 0 && (i + 1) % config.pause_every == 0 && !config.pause.is_zero() {
            tokio::time::sleep(config.pause).await;
        }
    }

    info!(
        "Deck {}: {} words added, {} sentences set, {} errors",
        deck_id, report.vocabulary_added, report.sentences_set, report.errors
    );
    Ok(report)
}

pub mod chunk_planner;
pub mod credentials;
pub mod deck;
pub mod error;
pub mod jpdb;
pub mod mapper;
pub mod pipeline;
pub mod reconciler;
pub mod report;
pub mod sentence_splitter;
pub mod tokenizer;

// Re-export main types for convenient access
pub use chunk_planner::{plan, Chunk, DEFAULT_MAX_CHUNK_SIZE};
pub use error::{PipelineError, PipelineResult};
pub use mapper::{locate_sentence, map, WordSentenceAssignment};
pub use reconciler::{reconcile, reconcile_all, GlobalToken};
pub use sentence_splitter::{split_sentences, SentenceSpan, SentenceSplitter, SplitterRules};
pub use tokenizer::{CardState, RawToken, Tokenizer, VocabularyKey, WordLabel};

// Re-export orchestration for the CLI and integration tests
pub use deck::{build_deck, select_words, DeckConfig, DeckReport, DeckService};
pub use pipeline::{PipelineConfig, PipelineOutput, PipelineStats, SentencePipeline};

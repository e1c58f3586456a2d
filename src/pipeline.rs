// WHY: ties split -> plan -> tokenize -> reconcile -> map together for one document;
// chunk calls may overlap but results are always reassembled in document order

use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chunk_planner::{self, Chunk, DEFAULT_MAX_CHUNK_SIZE};
use crate::mapper::{self, WordSentenceAssignment};
use crate::reconciler::{self, GlobalToken};
use crate::sentence_splitter::{SentenceSpan, SentenceSplitter, SplitterRules};
use crate::tokenizer::{RawToken, Tokenizer};

/// Configuration for chunked parsing
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum characters per parse request
    pub max_chunk_size: usize,
    /// Parse requests allowed in flight at once
    pub concurrency: usize,
    /// Minimum spacing between the starts of consecutive chunk requests,
    /// whatever the concurrency
    pub chunk_delay: Duration,
    /// Abort the document on the first failed chunk instead of mapping what succeeded
    pub fail_fast: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            concurrency: 1,
            chunk_delay: Duration::from_millis(300),
            fail_fast: true,
        }
    }
}

/// Per-run counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub chars_processed: u64,
    pub sentences_detected: u64,
    pub chunks_planned: u64,
    pub chunks_failed: u64,
    pub tokens_reconciled: u64,
    pub unique_words: u64,
    pub processing_time_ms: u64,
}

/// Everything produced for one document
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub sentences: Vec<SentenceSpan>,
    pub chunks: Vec<Chunk>,
    pub tokens: Vec<GlobalToken>,
    pub assignments: Vec<WordSentenceAssignment>,
    /// Indices of chunks whose parse failed when running with `fail_fast = false`
    pub failed_chunks: Vec<usize>,
    pub stats: PipelineStats,
}

pub struct SentencePipeline {
    splitter: SentenceSplitter,
    config: PipelineConfig,
}

impl SentencePipeline {
    pub fn new(rules: SplitterRules, config: PipelineConfig) -> Result<Self> {
        let splitter = SentenceSplitter::new(rules)?;
        Ok(Self { splitter, config })
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        Self::new(SplitterRules::default(), config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run<T: Tokenizer>(&self, document: &str, tokenizer: &T) -> Result<PipelineOutput> {
        self.run_with_progress(document, tokenizer, &ProgressBar::hidden()).await
    }

    /// Run the full pipeline, ticking `progress` once per parsed chunk
    pub async fn run_with_progress<T: Tokenizer>(
        &self,
        document: &str,
        tokenizer: &T,
        progress: &ProgressBar,
    ) -> Result<PipelineOutput> {
        let start_time = Instant::now();

        let sentences = self.splitter.split(document);
        let chunks = chunk_planner::plan(document, &sentences, self.config.max_chunk_size)?;
        let total = chunks.len();
        progress.set_length(total as u64);

        if total > 1 {
            info!("Text too large for one request, splitting into {} chunks", total);
        }

        let delay = self.config.chunk_delay;
        let last_request: Mutex<Option<Instant>> = Mutex::new(None);
        let last_request = &last_request;
        // buffered() yields in submission order, so results line up with chunk order
        let mut parsed = stream::iter(chunks.clone())
            .map(move |chunk| async move {
                if !delay.is_zero() {
                    // Lock is FIFO, so request starts are spaced in chunk order
                    let mut last = last_request.lock().await;
                    if let Some(previous) = *last {
                        tokio::time::sleep_until(previous + delay).await;
                    }
                    *last = Some(Instant::now());
                }
                debug!("Parsing chunk {}/{} ({} chars)", chunk.index + 1, total, chunk.len());
                let result = tokenizer.parse_chunk(&chunk.text).await;
                progress.inc(1);
                (chunk, result)
            })
            .buffered(self.config.concurrency.max(1));

        let mut succeeded: Vec<(Chunk, Vec<RawToken>)> = Vec::with_capacity(total);
        let mut failed_chunks = Vec::new();

        while let Some((chunk, result)) = parsed.next().await {
            match result {
                Ok(raw_tokens) => succeeded.push((chunk, raw_tokens)),
                Err(e) if self.config.fail_fast => {
                    return Err(anyhow::Error::new(e).context(format!("parsing chunk {}/{}", chunk.index + 1, total)));
                }
                Err(e) => {
                    warn!("Chunk {}/{} failed, continuing without it: {}", chunk.index + 1, total, e);
                    failed_chunks.push(chunk.index);
                }
            }
        }

        let tokens = reconciler::reconcile_all(succeeded)?;
        let assignments = mapper::map(&tokens, &sentences)?;

        let stats = PipelineStats {
            chars_processed: chunks.last().map_or(0, |c| c.end) as u64,
            sentences_detected: sentences.len() as u64,
            chunks_planned: total as u64,
            chunks_failed: failed_chunks.len() as u64,
            tokens_reconciled: tokens.len() as u64,
            unique_words: assignments.len() as u64,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Pipeline finished: {} sentences, {} chunks, {} tokens, {} unique words",
            stats.sentences_detected, stats.chunks_planned, stats.tokens_reconciled, stats.unique_words
        );

        Ok(PipelineOutput { sentences, chunks, tokens, assignments, failed_chunks, stats })
    }
}

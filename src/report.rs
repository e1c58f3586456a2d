// WHY: run summary written as JSON for scripting, plus the short console previews

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::deck::DeckReport;
use crate::mapper::WordSentenceAssignment;
use crate::pipeline::PipelineStats;

/// Characters of sentence shown per word in verbose previews
pub const PREVIEW_SENTENCE_CHARS: usize = 50;

/// Summary of one run, written by `--stats-out`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunStats {
    /// Seconds since the Unix epoch when the run started
    pub run_start: u64,
    pub input_file: String,
    pub deck_name: String,
    pub dry_run: bool,
    pub all_words: bool,
    pub words_selected: u64,
    pub pipeline: PipelineStats,
    /// Absent on dry runs
    pub deck: Option<DeckReport>,
    pub total_processing_time_ms: u64,
}

/// Write `stats` as pretty-printed JSON
pub async fn write_stats(path: &Path, stats: &RunStats) -> Result<()> {
    let content = serde_json::to_string_pretty(stats)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(content.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// One console line: `spelling (reading): first 50 chars of sentence...`
pub fn format_preview(assignment: &WordSentenceAssignment) -> String {
    let sentence = assignment.sentence.normalized();
    let shown: String = sentence.chars().take(PREVIEW_SENTENCE_CHARS).collect();
    format!("{} ({}): {}...", assignment.label.spelling, assignment.label.reading, shown)
}

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jpdb_sentences::credentials::{dotenv_problem, resolve_api_key};
use jpdb_sentences::deck::{build_deck, select_words, DeckConfig};
use jpdb_sentences::jpdb::{JpdbClient, JpdbConfig};
use jpdb_sentences::pipeline::{PipelineConfig, SentencePipeline};
use jpdb_sentences::report::{format_preview, write_stats, RunStats};
use jpdb_sentences::DEFAULT_MAX_CHUNK_SIZE;

/// Words listed by --verbose before the summary
const PREVIEW_WORDS: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "jpdb-sentences")]
#[command(about = "Create a jpdb.io deck from text with custom sentences for new vocabulary")]
#[command(
    after_help = "The API key can be provided via --api-key, the JPDB_API_KEY env var (a .env file is honoured), or ~/.jpdb_api_key.\nGet your API key from: https://jpdb.io/settings#api-key"
)]
#[command(version)]
struct Args {
    /// Path to the text file containing Japanese text
    input_file: PathBuf,

    /// Name for the new jpdb deck
    deck_name: String,

    /// jpdb API key (or set JPDB_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Parse text and show what would be done without making changes
    #[arg(long)]
    dry_run: bool,

    /// Set sentences for all words, not just new ones
    #[arg(long)]
    all_words: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Maximum characters per parse request
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE)]
    chunk_size: usize,

    /// Parse requests kept in flight at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Keep going when a chunk fails to parse, mapping only the chunks that succeeded
    #[arg(long)]
    keep_going: bool,

    /// Suppress console progress bars
    #[arg(long)]
    no_progress: bool,

    /// Write run statistics as JSON to this path
    #[arg(long)]
    stats_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Loaded before the subscriber so RUST_LOG may come from .env
    let dotenv = dotenvy::dotenv();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .json()
        .init();

    if let Some(e) = dotenv_problem(dotenv) {
        warn!("Ignoring malformed .env file: {}", e);
    }

    info!(
        input = %args.input_file.display(),
        deck = %args.deck_name,
        dry_run = args.dry_run,
        chunk_size = args.chunk_size,
        "Parsed CLI arguments"
    );

    if args.chunk_size == 0 {
        bail!("--chunk-size must be positive");
    }

    let run_start = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
    let started = Instant::now();

    let api_key = resolve_api_key(args.api_key.clone())?;

    let text = tokio::fs::read_to_string(&args.input_file)
        .await
        .with_context(|| format!("reading {}", args.input_file.display()))?;
    if text.trim().is_empty() {
        bail!("Input file is empty: {}", args.input_file.display());
    }

    let client = JpdbClient::new(JpdbConfig::new(api_key))?;

    if !args.dry_run {
        println!("Validating API key...");
        client.ping().await.context("Invalid API key")?;
    }

    let pipeline = SentencePipeline::with_config(PipelineConfig {
        max_chunk_size: args.chunk_size,
        concurrency: args.concurrency,
        fail_fast: !args.keep_going,
        ..PipelineConfig::default()
    })?;

    println!("Parsing text ({} characters)...", text.chars().count());
    let parse_progress = progress_bar(args.no_progress, "chunks");
    let output = pipeline.run_with_progress(&text, &client, &parse_progress).await?;
    parse_progress.finish_and_clear();

    println!(
        "Found {} tokens, {} unique words",
        output.stats.tokens_reconciled, output.stats.unique_words
    );
    println!("Split into {} sentences", output.stats.sentences_detected);
    if !output.failed_chunks.is_empty() {
        println!("Skipped {} chunks that failed to parse", output.failed_chunks.len());
    }

    let selected = select_words(&output.assignments, args.all_words);
    let status = if args.all_words { "all" } else { "new" };
    println!("Found {} {} words to set sentences for", selected.len(), status);

    if args.verbose {
        println!("\nWords and their sentences:");
        for assignment in selected.iter().take(PREVIEW_WORDS) {
            println!("  {}", format_preview(assignment));
        }
        if selected.len() > PREVIEW_WORDS {
            println!("  ... and {} more", selected.len() - PREVIEW_WORDS);
        }
    }

    let deck_report = if args.dry_run {
        println!("\n[Dry run - no changes made]");
        println!("Would create deck: {}", args.deck_name);
        println!("Would add {} vocabulary items", output.assignments.len());
        println!("Would set {} custom sentences", selected.len());
        None
    } else {
        println!("\nCreating deck: {}", args.deck_name);
        let deck_config = DeckConfig { all_words: args.all_words, ..DeckConfig::default() };
        let sentence_progress = progress_bar(args.no_progress, "sentences");
        let report = build_deck(&client, &args.deck_name, &output.assignments, &deck_config, &sentence_progress).await?;
        sentence_progress.finish_and_clear();

        println!("\nDone!");
        println!("  Deck created: {} (ID: {})", report.deck_name, report.deck_id);
        println!("  Vocabulary added: {}", report.vocabulary_added);
        println!("  Sentences set: {}", report.sentences_set);
        if report.errors > 0 {
            println!("  Errors: {}", report.errors);
        }
        Some(report)
    };

    if let Some(stats_path) = &args.stats_out {
        let stats = RunStats {
            run_start,
            input_file: args.input_file.display().to_string(),
            deck_name: args.deck_name.clone(),
            dry_run: args.dry_run,
            all_words: args.all_words,
            words_selected: selected.len() as u64,
            pipeline: output.stats.clone(),
            deck: deck_report,
            total_processing_time_ms: started.elapsed().as_millis() as u64,
        };
        write_stats(stats_path, &stats)
            .await
            .with_context(|| format!("writing stats to {}", stats_path.display()))?;
        info!("Wrote run stats to {}", stats_path.display());
    }

    Ok(())
}

fn progress_bar(hidden: bool, unit: &str) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(0);
    let template = format!("{{spinner}} [{{bar:40}}] {{pos}}/{{len}} {unit}");
    if let Ok(style) = ProgressStyle::with_template(&template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

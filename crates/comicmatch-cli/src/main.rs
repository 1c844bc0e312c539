use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use comicmatch_core::dedup::{DEFAULT_DUPLICATE_THRESHOLD, group_pairs};
use comicmatch_core::ingest::prepare_records;
use comicmatch_core::io::{export_duplicates, export_matches, load_records};
use comicmatch_core::parser::parse_title;
use comicmatch_core::{AppConfig, DuplicateFinder, Fields, IndexStrategy, MatchEngine, MatchResult, Side};

const SAMPLE_SIZE: usize = 5;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "comicmatch",
    about = "Match comic book records between two collections",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level: DEBUG, INFO, WARNING, ERROR or CRITICAL. RUST_LOG wins when set.
    #[arg(long, global = true, default_value = "INFO")]
    log_level: String,

    /// Output in JSON format (for scripts).
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the standard location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Match comics between two sources.
    Match {
        /// Source comics file (CSV or JSON).
        source: PathBuf,
        /// Target comics file (CSV or JSON).
        target: PathBuf,
        /// Output file for matches (CSV, or JSON by extension).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Similarity threshold (0-1).
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Indexing method: full, block or sortedneighbourhood.
        #[arg(short, long)]
        indexer: Option<IndexStrategy>,
        /// Pre-computed title similarity file.
        #[arg(short, long)]
        fuzzy_hash: Option<PathBuf>,
        /// Write the similarity cache here after matching.
        #[arg(long)]
        save_hash: Option<PathBuf>,
        /// Print sample matches.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse a comic title and show its components.
    Parse { title: String },

    /// Find likely duplicates within one collection.
    Dedup {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, default_value_t = DEFAULT_DUPLICATE_THRESHOLD)]
        threshold: f64,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Match {
            source,
            target,
            output,
            threshold,
            indexer,
            fuzzy_hash,
            save_hash,
            verbose,
        } => {
            let mut config = config;
            if let Some(threshold) = threshold {
                config.matching.threshold = threshold;
            }
            if let Some(indexer) = indexer {
                config.matching.indexer = indexer;
            }
            if let Some(path) = fuzzy_hash {
                config.cache.path = Some(path);
            }

            let engine = MatchEngine::from_app_config(&config);
            let source_rows = load_or_empty(&source);
            let target_rows = load_or_empty(&target);
            let results = if source_rows.is_empty() || target_rows.is_empty() {
                error!("Failed to load source or target data");
                Vec::new()
            } else {
                info!(
                    "Loaded {} source comics and {} target comics",
                    source_rows.len(),
                    target_rows.len()
                );
                engine.match_collections(source_rows, target_rows)
            };

            let saved_to = output.filter(|_| !results.is_empty()).and_then(|path| {
                match export_matches(&path, &results) {
                    Ok(_) => Some(path),
                    Err(e) => {
                        error!("Error exporting matches to {}: {e}", path.display());
                        None
                    }
                }
            });

            let cache_target = save_hash.or_else(|| {
                config
                    .cache
                    .path
                    .clone()
                    .filter(|_| config.cache.save_on_exit)
            });
            if let Some(path) = cache_target {
                engine.persist_cache(&path);
            }

            if cli.json {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "total": results.len(),
                        "items": results,
                        "output": saved_to,
                    }
                }))?;
            } else if results.is_empty() {
                println!("No matches found");
            } else {
                println!("Found {} matches", results.len());
                if let Some(path) = &saved_to {
                    println!("Saved matches to {}", path.display());
                }
                if verbose {
                    println!("\nSample matches:");
                    for result in results.iter().take(SAMPLE_SIZE) {
                        println!("  {}", sample_line(result));
                    }
                }
            }
        }

        Commands::Parse { title } => {
            let parsed = parse_title(&title);
            if cli.json {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "title": title, "components": parsed }
                }))?;
            } else {
                println!("Title: {title}");
                println!("\nParsed components:");
                for (name, value) in parsed.entries() {
                    println!("  {name}: {value}");
                }
            }
        }

        Commands::Dedup {
            file,
            output,
            threshold,
        } => {
            let records = prepare_records(load_or_empty(&file), Side::Source);
            let finder = DuplicateFinder::new().with_title_threshold(threshold);
            let pairs = finder.find_pairs(&records);
            let groups = group_pairs(records.len(), &pairs);

            if let Some(path) = &output
                && let Err(e) = export_duplicates(path, &records, &pairs)
            {
                error!("Error exporting duplicates to {}: {e}", path.display());
            }

            if cli.json {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "pairs": pairs, "groups": groups }
                }))?;
            } else if pairs.is_empty() {
                println!("No duplicates found");
            } else {
                println!("Found {} duplicate pairs in {} groups", pairs.len(), groups.len());
                for group in &groups {
                    let canonical = &records[group.canonical];
                    println!("  {} #{}", canonical.title, canonical.issue);
                    for idx in &group.duplicates {
                        println!("    = {} #{}", records[*idx].title, records[*idx].issue);
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Map a `--log-level` name onto a tracing filter directive. Unknown names
/// fall back to `info`.
fn log_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loader failures are logged and treated as an empty collection.
fn load_or_empty(path: &Path) -> Vec<Fields> {
    match load_records(path) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Error loading comics from {}: {e}", path.display());
            Vec::new()
        }
    }
}

fn sample_line(result: &MatchResult) -> String {
    format!(
        "{} #{} = {} #{} (similarity: {:.2})",
        result.source.title,
        result.source.issue,
        result.target.title,
        result.target.issue,
        result.similarity
    )
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

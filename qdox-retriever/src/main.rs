use clap::{Args, Parser, Subcommand};
use qdox_retriever::{
    QdoxConfig,
    retrieval::{
        query::{AcceptanceStrategy, QueryResult},
        reindex::ReindexCoordinator,
        snapshot::{ModelSnapshot, RankedDocument, SearchContext},
    },
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// A CLI tool to search a folder of text documents by meaning.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to qdox.toml inside the searched folder)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index a folder and run a single query
    Search {
        /// Folder containing the documents
        folder: PathBuf,
        /// Free-text query
        query: String,
        #[command(flatten)]
        options: QueryOptions,
    },
    /// Index a folder, keep it up to date and answer queries read from stdin
    Watch {
        /// Folder containing the documents
        folder: PathBuf,
        #[command(flatten)]
        options: QueryOptions,
        /// Rescan interval of the directory watcher in milliseconds
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// Capacity of the pending change-event queue
        #[arg(long)]
        max_events: Option<usize>,
    },
}

/// Flags overriding values from the config file
#[derive(Args, Debug, Default)]
struct QueryOptions {
    /// Regular expression selecting document paths
    #[arg(short = 'P', long)]
    pattern: Option<String>,
    /// Maximum number of results
    #[arg(short = 'n', long)]
    top_n: Option<usize>,
    /// Minimum similarity threshold
    #[arg(short, long, allow_negative_numbers = true)]
    threshold: Option<f64>,
    /// Reduction rank of the LSI model
    #[arg(long)]
    rank: Option<usize>,
    /// Acceptance strategy (monotonic-scan or threshold)
    #[arg(long)]
    strategy: Option<AcceptanceStrategy>,
    /// Output format
    #[arg(short, long, default_value = "summary")]
    format: OutputFormat,
}

impl QueryOptions {
    fn apply(&self, config: &mut QdoxConfig) {
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(rank) = self.rank {
            config.rank = rank;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    generation: u64,
    results: Vec<RankedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            folder,
            query,
            options,
        } => {
            let mut config = QdoxConfig::discover(&folder, cli.config.as_deref())?;
            options.apply(&mut config);

            let snapshot = build_snapshot(&folder, &config, 0).await?;
            let result =
                snapshot.query_with(config.strategy, &query, config.top_n, config.threshold);
            print_result(&snapshot, &result, options.format)?;
            match result.error {
                Some(error) => Err(anyhow::anyhow!("Query {:?} failed: {}", query, error)),
                None => Ok(()),
            }
        }
        Commands::Watch {
            folder,
            options,
            poll_interval_ms,
            max_events,
        } => {
            let mut config = QdoxConfig::discover(&folder, cli.config.as_deref())?;
            options.apply(&mut config);
            if let Some(poll_interval_ms) = poll_interval_ms {
                config.poll_interval_ms = poll_interval_ms;
            }
            if let Some(max_events) = max_events {
                config.max_events = max_events;
            }
            watch(&folder, &config, options.format).await
        }
    }
}

async fn build_snapshot(
    folder: &Path,
    config: &QdoxConfig,
    generation: u64,
) -> anyhow::Result<Arc<ModelSnapshot>> {
    let pattern = config.path_pattern()?;
    let lsi = config.lsi_config();
    let root = folder.to_path_buf();
    let snapshot = tokio::task::spawn_blocking(move || {
        ModelSnapshot::build(&root, |path| pattern.matches(path), &lsi, generation)
    })
    .await??;
    Ok(Arc::new(snapshot))
}

async fn watch(folder: &Path, config: &QdoxConfig, format: OutputFormat) -> anyhow::Result<()> {
    let context = SearchContext::new().with_strategy(config.strategy);
    context.publish(build_snapshot(folder, config, 0).await?);

    let reindex = config.reindex_config(folder)?.with_first_generation(1);
    let mut coordinator = ReindexCoordinator::start(reindex, context.publisher()).await?;
    info!("Ready for queries, one per line");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let query = line.trim();
                if query.is_empty() {
                    continue;
                }
                // Hold one snapshot for the whole query so paths and scores agree
                let Some(snapshot) = context.current() else {
                    warn!("No snapshot published yet");
                    continue;
                };
                let result =
                    snapshot.query_with(config.strategy, query, config.top_n, config.threshold);
                print_result(&snapshot, &result, format)?;
                // A bad query is reported and the session goes on
                if let Some(error) = &result.error {
                    eprintln!("Query {:?} failed: {}", result.query, error);
                }
            }
        }
    }

    coordinator.stop().await?;
    let stats = coordinator.stats();
    info!(
        "Reindexed {} times ({} failures, {} dropped events)",
        stats.reloads, stats.failures, stats.dropped_events
    );
    Ok(())
}

fn print_result(
    snapshot: &ModelSnapshot,
    result: &QueryResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ranked = snapshot.resolve(result);
    match format {
        OutputFormat::Json => {
            let output = SearchOutput {
                query: &result.query,
                generation: snapshot.generation(),
                results: ranked,
                error: result.error.as_ref().map(|e| e.to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Summary => {
            for doc in ranked {
                println!(
                    "{:.0}% {:?}",
                    doc.similarity * 100.0,
                    doc.path.display().to_string()
                );
            }
        }
    }
    Ok(())
}

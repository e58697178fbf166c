//! ptt-harvest main entry point
//!
//! This is the command-line interface for the board harvester.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ptt_harvest::config::{load_config_with_hash, validate_board_name, Config, LoggingConfig};
use ptt_harvest::crawler::{harvest, BoardRange, BoardReport, TraversalMode};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// ptt-harvest: incremental bulletin-board harvester
///
/// Crawls board listing pages, fetches every article with its push comments
/// and stores them in SQLite. Articles already stored are skipped.
#[derive(Parser, Debug)]
#[command(name = "ptt-harvest")]
#[command(version)]
#[command(about = "Incremental bulletin-board harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl one board between two page indices (inclusive, either direction)
    Range {
        /// Board name, e.g. NBA
        #[arg(long)]
        board: String,

        /// First page to visit; defaults to the board's configured start-page
        #[arg(long)]
        start: Option<u32>,

        /// Last page to visit; defaults to the board's configured end-page
        #[arg(long)]
        end: Option<u32>,
    },

    /// Poll the newest page of every configured board
    Latest {
        /// Stop after this many cycles instead of polling forever
        #[arg(long)]
        cycles: Option<u64>,
    },

    /// Crawl every configured board over its configured page range
    Batch,

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            setup_logging(cli.verbose, cli.quiet, None)?;
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| format!("loading {}", cli.config.display()));
        }
    };

    setup_logging(cli.verbose, cli.quiet, Some(&config.logging))?;
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    let Some(mode) = build_mode(&cli.command, &config)? else {
        return handle_stats(&config);
    };

    if cli.dry_run {
        handle_dry_run(&config, &mode);
        return Ok(());
    }

    handle_harvest(config, &config_hash, &mode).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to the configured file when one is set, otherwise to stderr.
fn setup_logging(verbose: u8, quiet: bool, logging: Option<&LoggingConfig>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ptt_harvest=info,warn"),
            1 => EnvFilter::new("ptt_harvest=debug,info"),
            2 => EnvFilter::new("ptt_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match logging.and_then(|l| l.file.as_deref().map(|file| (file, l.append))) {
        Some((path, append)) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .append(append)
                .truncate(!append)
                .open(path)
                .with_context(|| format!("opening log file {}", path))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

/// Turns the chosen command and the configuration into a traversal mode
///
/// Returns `None` for commands that do not crawl.
fn build_mode(command: &Command, config: &Config) -> anyhow::Result<Option<TraversalMode>> {
    let mode = match command {
        Command::Range { board, start, end } => {
            validate_board_name(board)?;
            let configured = config
                .boards
                .iter()
                .find(|b| &b.name == board)
                .and_then(|b| b.range());

            let (start_page, end_page) = match (start, end, configured) {
                (Some(s), Some(e), _) => (*s, *e),
                (s, e, Some((cs, ce))) => (s.unwrap_or(cs), e.unwrap_or(ce)),
                _ => anyhow::bail!(
                    "board '{}' has no configured range; pass --start and --end",
                    board
                ),
            };

            if start_page == 0 || end_page == 0 {
                anyhow::bail!("page indices start at 1");
            }

            TraversalMode::BoundedRange(BoardRange {
                board: board.clone(),
                start_page,
                end_page,
            })
        }
        Command::Latest { cycles } => TraversalMode::latest_from_config(config, *cycles),
        Command::Batch => TraversalMode::batch_from_config(config)?,
        Command::Stats => return Ok(None),
    };

    Ok(Some(mode))
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, mode: &TraversalMode) {
    println!("=== ptt-harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Page delay: {}ms", config.crawler.page_delay);
    println!("  Poll interval: {}s", config.crawler.poll_interval);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nMode: {}", mode.name());
    match mode {
        TraversalMode::BoundedRange(range) => print_range(range),
        TraversalMode::MultiBoard(ranges) => ranges.iter().for_each(print_range),
        TraversalMode::LatestPage {
            boards,
            poll_interval,
            max_cycles,
        } => {
            for board in boards {
                println!("  - {} (newest page)", board);
            }
            match max_cycles {
                Some(n) => println!("  {} cycles, {:?} apart", n, poll_interval),
                None => println!("  Polling forever, {:?} apart", poll_interval),
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

fn print_range(range: &BoardRange) {
    println!(
        "  - {}: index{} -> index{} ({} pages)",
        range.board,
        range.start_page,
        range.end_page,
        range.start_page.abs_diff(range.end_page) + 1
    );
}

/// Handles the stats command: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use ptt_harvest::output::{load_statistics, print_statistics};
    use ptt_harvest::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    config_hash: &str,
    mode: &TraversalMode,
) -> anyhow::Result<()> {
    match harvest(config, config_hash, mode).await {
        Ok(reports) => {
            log_summary(&reports);
            tracing::info!("Harvest completed successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Main error: {}", e);
            Err(e.into())
        }
    }
}

fn log_summary(reports: &[BoardReport]) {
    for report in reports {
        tracing::info!(
            "[{}] {} pages visited, {} articles stored{}",
            report.board,
            report.pages.len(),
            report.articles_stored(),
            if report.aborted { " (aborted)" } else { "" }
        );
    }
}

//! Sydney events aggregator CLI
//!
//! Runs aggregation passes and prints API responses as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use event_aggregator::{
    api::{AllEventsQuery, EventsApi},
    error::Result,
    models::Config,
    services::HttpBrowser,
    storage::LocalStorage,
};
use serde::Serialize;

/// Sydney events aggregator
#[derive(Parser, Debug)]
#[command(
    name = "event-aggregator",
    version,
    about = "Aggregates Sydney event listings by category"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate all events grouped by category
    All {
        /// Ignore any cached result
        #[arg(long)]
        no_cache: bool,

        /// Accepted for compatibility; each category page is fetched once
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Events of a single category
    Category {
        name: String,
    },

    /// List the known categories
    Categories,

    /// Search titles, descriptions and locations
    Search {
        /// Case-insensitive search text
        query: String,

        /// Restrict the search to one category
        #[arg(long)]
        category: Option<String>,
    },

    /// Force a fresh aggregation pass
    Refresh,

    /// Statistics and cache status
    Stats,

    /// Aggregate and write the envelope to a timestamped JSON file
    Dump {
        /// Output directory (default: output.dump_dir from config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main entry point for the CLI application.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!(
            "✓ Config OK ({} sources, {} category pages)",
            config.sources.len(),
            config.sources.iter().map(|s| s.categories.len()).sum::<usize>()
        );
        return Ok(());
    }

    config.validate()?;
    let config = Arc::new(config);
    let browser = HttpBrowser::new(config.fetcher.clone());
    let mut api = EventsApi::new(Arc::clone(&config), browser);

    match cli.command {
        Command::All {
            no_cache,
            max_pages,
        } => print_json(&api.all_events(AllEventsQuery {
            max_pages,
            use_cache: !no_cache,
        }))?,
        Command::Category { name } => print_json(&api.category_events(&name))?,
        Command::Categories => print_json(&EventsApi::<HttpBrowser>::categories())?,
        Command::Search { query, category } => {
            print_json(&api.search(Some(query.as_str()), category.as_deref())?)?
        }
        Command::Refresh => print_json(&api.refresh())?,
        Command::Stats => print_json(&api.stats())?,
        Command::Dump { output_dir } => {
            let envelope = api.all_events(AllEventsQuery::default());
            if !envelope.success {
                log::error!(
                    "Aggregation failed: {}",
                    envelope.error.as_deref().unwrap_or("unknown error")
                );
            }
            let dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output.dump_dir));
            let path = LocalStorage::new(dir).write_snapshot(&envelope)?;

            if let Some(stats) = &envelope.statistics {
                log::info!("Total events: {}", stats.total_events);
                for (key, count) in &stats.source_counts {
                    log::info!("  {key}: {count}");
                }
                log::info!("Categories: {}", stats.categories_with_events);
            }
            log::info!("File: {}", path.display());
        }
        Command::Validate => {}
    }

    Ok(())
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the price ingestion pipeline.

use std::sync::Arc;

use bei_map_ingest::PricePipeline;
use bei_map_scraper::HttpFetcher;
use bei_map_source::registry;
use bei_map_store::MemoryPriceStore;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bei_map_ingest", about = "Tanzania commodity price ingestion tool")]
struct Cli {
    /// Directory for cached PDF binaries
    #[arg(long, default_value = "downloads/pdfs")]
    download_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one daily scraping pass over all sources
    Daily,
    /// Run the one-shot historical backfill against the full listing
    Historical,
    /// Run the document monitor and daily schedule for the process lifetime
    Monitor {
        /// Poll interval in seconds (clamped to 300–86400)
        #[arg(long, default_value = "3600")]
        interval: u64,
        /// Interval between scheduled daily scraping runs, in seconds
        #[arg(long, default_value = "86400")]
        daily_interval: u64,
    },
    /// Run one monitor check immediately
    Check,
    /// Print monitor status
    Status,
    /// Print the latest prices from both pipelines
    Latest,
    /// Print price history
    History {
        /// Filter by crop key or marketplace crop name
        #[arg(long)]
        crop: Option<String>,
        /// How many days back to look
        #[arg(long, default_value = "30")]
        days: i64,
    },
    /// Print quality-filtered documents for model training
    Training {
        /// Minimum quality score in [0, 1]
        #[arg(long, default_value = "0.5")]
        min_quality: f64,
        /// Filter by source identifier
        #[arg(long)]
        source: Option<String>,
        /// Maximum number of documents
        #[arg(long, default_value = "100")]
        limit: usize,
    },
    /// Print aggregate statistics for the latest live snapshot
    Summary,
    /// List configured data sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let check_interval = match &cli.command {
        Commands::Monitor { interval, .. } => *interval,
        _ => 3600,
    };

    let fetcher = Arc::new(HttpFetcher::new()?);
    let store = Arc::new(MemoryPriceStore::new());
    let pipeline = PricePipeline::new(
        registry::load(),
        fetcher,
        store,
        cli.download_dir.clone(),
        check_interval,
    );

    match cli.command {
        Commands::Daily => {
            let report = pipeline.trigger_daily_scrape().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Historical => {
            let report = pipeline.trigger_historical_scrape().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Monitor { daily_interval, .. } => {
            pipeline
                .run(std::time::Duration::from_secs(daily_interval))
                .await;
        }
        Commands::Check => {
            pipeline.monitor().load_known_documents().await?;
            let outcome = pipeline.check_monitor_now().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Status => {
            let status = pipeline.monitor_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Latest => {
            let latest = pipeline.latest_prices().await?;
            println!("{}", serde_json::to_string_pretty(&latest)?);
        }
        Commands::History { crop, days } => {
            let history = pipeline.price_history(crop.as_deref(), days).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Training {
            min_quality,
            source,
            limit,
        } => {
            let documents = pipeline
                .quality_filtered_training_data(min_quality, source.as_deref(), limit)
                .await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        Commands::Summary => {
            let summary = pipeline.live_price_summary().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Sources => {
            let registry = pipeline.orchestrator().registry();
            println!("{:<20} SOURCE", "ID");
            println!("{}", "-".repeat(60));
            println!(
                "{:<20} {} ({})",
                registry.bulletin.id, registry.bulletin.name, registry.bulletin.listing.listing_url
            );
            println!(
                "{:<20} {} ({})",
                registry.live_market.id,
                registry.live_market.market.source,
                registry.live_market.market.url
            );
        }
    }

    Ok(())
}

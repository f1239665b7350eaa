use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use lease_scout::apis::AdapterRegistry;
use lease_scout::config::Config;
use lease_scout::constants::DEFAULT_LOG_DIR;
use lease_scout::error::ScoutError;
use lease_scout::logging;
use lease_scout::pipeline::processing::diff::PriceChange;
use lease_scout::pipeline::storage::FileStore;
use lease_scout::pipeline::{Pipeline, RunReport};
use lease_scout::types::SiteAdapter;

#[derive(Parser)]
#[command(name = "lease_scout")]
#[command(about = "Collects car lease offers across sites and tracks price changes")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once
    Run {
        /// Sites to run (comma-separated, partial names allowed)
        #[arg(long)]
        sites: Option<String>,
        /// Write the full run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Run the pipeline on a fixed interval until interrupted
    Watch {
        /// Seconds between runs (defaults to schedule.interval_seconds)
        #[arg(long)]
        every: Option<u64>,
        /// Sites to run (comma-separated, partial names allowed)
        #[arg(long)]
        sites: Option<String>,
    },
    /// List the configured sites
    Sites,
    /// Show accumulated run statistics and recent history
    Stats {
        /// Days of history to show
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
}

fn select_adapters(
    registry: &AdapterRegistry,
    sites: Option<&str>,
) -> anyhow::Result<Vec<Arc<dyn SiteAdapter>>> {
    let adapters = match sites {
        Some(list) => {
            let names: Vec<&str> = list.split(',').map(str::trim).collect();
            registry.select(&names)
        }
        None => registry.all(),
    };
    if adapters.is_empty() {
        anyhow::bail!(
            "no sites selected; available: {}",
            registry.sites().join(", ")
        );
    }
    Ok(adapters)
}

fn print_report(report: &RunReport) {
    println!("\n📊 Run {} results:", report.run_id);
    for (site, counts) in &report.per_site_counts {
        if counts.failed {
            println!("   {}: ❌ failed", site);
        } else {
            println!(
                "   {}: {} fetched, {} accepted, {} rejected, {} filtered out",
                site, counts.fetched, counts.accepted, counts.rejected, counts.filtered_out
            );
        }
    }
    println!("   Total offers: {}", report.total_offers);

    if !report.grouped_best_offers.is_empty() {
        println!("\n🏆 Best offers:");
        for group in &report.grouped_best_offers {
            if let Some(best) = group.best() {
                println!(
                    "   {} {}: €{}/month for {} months at {} ({} offers)",
                    group.brand,
                    group.model,
                    best.monthly_price,
                    best.duration_months,
                    best.site,
                    group.len()
                );
            }
        }
    }

    let summary = &report.diff_summary;
    println!(
        "\n📈 Changes: {} new, {} decreased, {} increased, {} unchanged",
        summary.new, summary.decreased, summary.increased, summary.same
    );
    for result in &report.diff_results {
        let offer = &result.offer;
        match result.change {
            PriceChange::Decreased => println!(
                "   ⬇️  {} {} ({}): -€{}",
                offer.brand, offer.model, offer.site, result.delta
            ),
            PriceChange::Increased => println!(
                "   ⬆️  {} {} ({}): +€{}",
                offer.brand, offer.model, offer.site, result.delta
            ),
            PriceChange::New | PriceChange::Same => {}
        }
    }

    if !report.adapter_failures.is_empty() {
        println!("\n⚠️  Adapter failures:");
        for failure in &report.adapter_failures {
            println!("   - {}: {}", failure.site, failure.reason);
        }
    }
    if !report.persisted() {
        println!("\n⚠️  No offers accepted, previous snapshot kept");
    }
}

fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    println!("📝 Report written to {}", path.display());
    Ok(())
}

async fn watch(
    pipeline: Arc<Pipeline>,
    adapters: Vec<Arc<dyn SiteAdapter>>,
    config: &Config,
    every: Duration,
) -> anyhow::Result<()> {
    println!("⏰ Running every {}s, press Ctrl+C to stop", every.as_secs());
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pipeline = Arc::clone(&pipeline);
                let adapters = adapters.clone();
                let filter = config.filter.clone();
                tokio::spawn(async move {
                    match pipeline.run(&adapters, &filter).await {
                        Ok(report) => print_report(&report),
                        Err(ScoutError::RunInProgress) => {
                            warn!("Previous run still active, skipping this tick");
                        }
                        Err(e) => error!("Scheduled run failed: {}", e),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping scheduler");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging(Path::new(DEFAULT_LOG_DIR));

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    let registry = AdapterRegistry::from_feeds(&config.adapters.sites, &config.adapters.feeds_dir);
    let store = Arc::new(FileStore::new(&config.storage.data_dir));
    let pipeline = Arc::new(Pipeline::new(store, config.pipeline_options()));

    match cli.command {
        Commands::Run { sites, report } => {
            println!("🚀 Running lease pipeline...");
            let adapters = select_adapters(&registry, sites.as_deref())?;
            let result = pipeline.run(&adapters, &config.filter).await?;
            print_report(&result);
            if let Some(path) = report {
                write_report(&result, &path)?;
            }
        }
        Commands::Watch { every, sites } => {
            let adapters = select_adapters(&registry, sites.as_deref())?;
            let every = Duration::from_secs(every.unwrap_or(config.schedule.interval_seconds).max(1));
            watch(pipeline, adapters, &config, every).await?;
        }
        Commands::Sites => {
            println!("📋 Configured sites (feeds in {}):", config.adapters.feeds_dir.display());
            for site in registry.sites() {
                println!("   - {}", site);
            }
        }
        Commands::Stats { days } => {
            let stats = pipeline.stats().await?;
            println!("📊 Total runs: {}", stats.total_runs);
            match stats.last_run {
                Some(at) => println!("   Last run: {}", at.to_rfc3339()),
                None => println!("   Last run: never"),
            }
            println!("   Total offers found: {}", stats.total_offers_found);
            for (site, site_stats) in &stats.site_stats {
                println!(
                    "   {}: {} offers over {} runs (avg {})",
                    site, site_stats.total_offers, site_stats.runs, site_stats.average_offers
                );
            }

            let history = pipeline.history(days).await?;
            println!("\n🗓️  Last {} days: {} runs", days, history.len());
            for entry in &history {
                println!("   {}: {} offers", entry.timestamp.to_rfc3339(), entry.offer_count);
            }
        }
    }
    Ok(())
}

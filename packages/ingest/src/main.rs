#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the traffic-signal geocoding tool.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use signal_map_cli_utils::{IndicatifProgress, init_logger};
use signal_map_geocoder::service_registry::all_services;
use signal_map_ingest::{
    PipelineOptions, default_service, geocoder_for, load_snapshot, region_stats, run_pipeline,
};
use signal_map_signal::aggregate::aggregate_intersections;
use signal_map_signal::light::classify_snapshot;
use signal_map_signal::query::LightFilter;

#[derive(Parser)]
#[command(
    name = "signal_map_ingest",
    about = "Traffic-signal geocoding and query tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode a raw facility export into a processed snapshot
    Geocode {
        /// Raw facility records (JSON array)
        #[arg(long)]
        input: PathBuf,
        /// Where to write the processed snapshot
        #[arg(long)]
        output: PathBuf,
        /// Minimum milliseconds between geocoding requests (defaults to the
        /// service configuration)
        #[arg(long)]
        rate_limit_ms: Option<u64>,
        /// Only process the first N records (for testing)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List configured geocoding services
    Services,
    /// Print classified lights from a processed snapshot as JSON
    Lights {
        /// Processed snapshot
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print intersections aggregated from a processed snapshot as JSON
    Intersections {
        /// Processed snapshot
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print per-region light counts and geocoding coverage
    Stats {
        /// Processed snapshot
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Exact region label (e.g., "수원시"), or "all"
    #[arg(long)]
    region: Option<String>,
    /// Priority rank, 1 (highest) to 5
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    priority: Option<u8>,
    /// Case-insensitive text matched against name, intersection, address and region
    #[arg(long)]
    query: Option<String>,
}

impl From<FilterArgs> for LightFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            region: args.region,
            priority: args.priority,
            query: args.query,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return signal_map_ingest::interactive::run(&multi).await;
    };

    match command {
        Commands::Geocode {
            input,
            output,
            rate_limit_ms,
            limit,
        } => {
            let service = default_service()?;
            let geocoder = geocoder_for(&service)?;
            let options = PipelineOptions {
                rate_limit: rate_limit_ms
                    .map_or_else(|| service.rate_limit(), Duration::from_millis),
                limit,
                ..PipelineOptions::default()
            };

            let progress = IndicatifProgress::addresses_bar(&multi, "Geocoding addresses");
            run_pipeline(&input, &output, &geocoder, &options, progress).await?;
        }
        Commands::Services => {
            println!("{:<10} {:<8} {:<10} NAME", "ID", "ENABLED", "SPACING");
            println!("{}", "-".repeat(60));
            for service in &all_services() {
                println!(
                    "{:<10} {:<8} {:<10} {}",
                    service.id,
                    service.enabled,
                    format!("{}ms", service.rate_limit().as_millis()),
                    service.name
                );
            }
        }
        Commands::Lights { input, filter } => {
            let lights = classify_snapshot(&load_snapshot(&input)?);
            let lights = LightFilter::from(filter).apply(&lights);
            println!("{}", serde_json::to_string_pretty(&lights)?);
        }
        Commands::Intersections { input, filter } => {
            let lights = classify_snapshot(&load_snapshot(&input)?);
            let lights = LightFilter::from(filter).apply(&lights);
            let intersections = aggregate_intersections(&lights);
            println!("{}", serde_json::to_string_pretty(&intersections)?);
        }
        Commands::Stats { input } => {
            let snapshot = load_snapshot(&input)?;
            println!(
                "{:<16} {:>8} {:>8} {:>8}",
                "REGION", "LIGHTS", "LOCATED", "COVERAGE"
            );
            println!("{}", "-".repeat(44));
            for stats in region_stats(&snapshot) {
                println!(
                    "{:<16} {:>8} {:>8} {:>7.1}%",
                    stats.region,
                    stats.total,
                    stats.with_coordinates,
                    stats.completion()
                );
            }
        }
    }

    Ok(())
}

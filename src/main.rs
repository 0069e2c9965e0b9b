//! schemasync - Schema Drift Detection & Catalog Ingestion
//!
//! Reads Avro, CSV and Parquet files, infers their field schema, compares it
//! with the schema seen on the previous run, writes an HTML report when it
//! drifted, and pushes the dataset's metadata to a DataHub catalog.
//!
//! PIPELINE (per dataset, in configured order):
//! - Read: open the source and extract field names and native types
//! - Normalize: map native types onto the canonical buckets
//! - Diff: compare with the cached snapshot, report drift
//! - Emit: build the metadata change event and POST it to the catalog

mod catalog;
mod config;
mod error;
mod models;
mod normalize;
mod pipeline;
mod reader;
mod report;
mod snapshot;

use crate::catalog::{DryRunEmitter, Emitter, RestEmitter};
use crate::config::{Overrides, Settings};
use crate::pipeline::Orchestrator;
use crate::snapshot::SchemaCache;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Detect schema drift in data files and publish their schemas to DataHub
#[derive(Debug, Parser)]
#[command(name = "schemasync", version, about)]
struct Cli {
    /// TOML configuration file (defaults to ./schemasync.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Catalog (GMS) base URL
    #[arg(long, value_name = "URL")]
    service_url: Option<String>,

    /// Catalog platform tag; defaults to each dataset's format
    #[arg(long)]
    platform: Option<String>,

    /// Catalog environment tag, e.g. DEV or PROD
    #[arg(long)]
    env: Option<String>,

    /// Directory holding the per-dataset schema cache
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Directory receiving HTML diff reports
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Log the change events instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Open each diff report in a viewer after writing it
    #[arg(long)]
    open_reports: bool,

    /// Print the datasets that have a cached schema and exit
    #[arg(long)]
    list_cached: bool,

    /// Trace-level logging for schemasync itself
    #[arg(short, long)]
    verbose: bool,

    /// Emit log lines as JSON objects
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            service_url: self.service_url.clone(),
            platform: self.platform.clone(),
            env: self.env.clone(),
            cache_dir: self.cache_dir.clone(),
            report_dir: self.report_dir.clone(),
            open_reports: self.open_reports,
            require_datasets: !self.list_cached,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for structured logging
    init_tracing(cli.verbose, cli.log_json);

    let settings = Settings::load(&cli.overrides())?;
    info!("📋 Configuration loaded successfully");

    if cli.list_cached {
        let cache = SchemaCache::new(&settings.cache_dir);
        let names = cache.list()?;
        if names.is_empty() {
            info!("📭 No cached schemas in {}", cache.dir().display());
        }
        for name in names {
            println!("{}", name);
        }
        return Ok(());
    }

    let emitter = if cli.dry_run {
        warn!("🧪 Dry run: change events will be logged, not sent");
        Emitter::DryRun(DryRunEmitter)
    } else {
        info!("🌐 Emitting to {}", settings.service_url);
        Emitter::Rest(RestEmitter::new(
            &settings.service_url,
            settings.token.clone(),
            settings.request_timeout(),
        )?)
    };

    let orchestrator = Orchestrator::new(&settings, emitter);
    info!(
        "🚀 Starting run {} over {} dataset(s)",
        orchestrator.run_id(),
        settings.datasets.len()
    );

    let summary = orchestrator.run(&settings.datasets).await;

    if summary.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::new("info,schemasync=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,schemasync=debug"))
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_file(true)
                    .with_line_number(true)
                    .compact(),
            )
            .init();
    }
}

//! msync entry point.
//!
//! This file is intentionally thin: it bootstraps env + tracing, resolves
//! credentials, builds the marketplace adapters, and hands everything to
//! msync-runtime. All sync logic lives in the library crates.
//!
//! Exit codes: 0 = SUCCESS, 1 = PARTIAL, 2 = FAILED.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use uuid::Uuid;

use msync_catalog::CatalogProvider;
use msync_config::{
    load_settings, resolve_ozon_credentials, resolve_yandex_credentials, settings_hash,
};
use msync_dispatch::UpdateApi;
use msync_feed::{CsvFeedSource, SourceProvider};
use msync_market_ozon::{OzonCatalogProvider, OzonClient, OzonUpdateApi};
use msync_market_yandex::{YandexCatalogProvider, YandexClient, YandexUpdateApi};
use msync_reconcile::SkuLookup;
use msync_runtime::{gather_and_plan, run_sync, RunReport};
use msync_schemas::RunStatus;

#[derive(Parser)]
#[command(name = "msync")]
#[command(about = "Marketplace inventory sync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Marketplace {
    Ozon,
    Yandex,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the feed against the marketplace and push updates.
    Run {
        /// Target marketplace.
        #[arg(long, value_enum)]
        marketplace: Marketplace,

        /// Supplier feed CSV (columns: sku, quantity, price[, sales_model]).
        #[arg(long)]
        feed: PathBuf,

        /// Settings YAML; defaults apply when omitted.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Optional listing_id -> sku mapping CSV for unlabeled listings.
        #[arg(long = "sku-map")]
        sku_map: Option<PathBuf>,
    },

    /// Compute the update plan and print it; submits nothing.
    Plan {
        #[arg(long, value_enum)]
        marketplace: Marketplace,

        #[arg(long)]
        feed: PathBuf,

        #[arg(long)]
        settings: Option<PathBuf>,

        #[arg(long = "sku-map")]
        sku_map: Option<PathBuf>,
    },

    /// Print the canonical hash of the effective settings.
    SettingsHash {
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    match dispatch_command(cli.cmd).await {
        Ok(code) => code,
        // Config / credential / usage failures: nothing ran, exit FAILED.
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn dispatch_command(cmd: Commands) -> Result<ExitCode> {
    match cmd {
        Commands::Run {
            marketplace,
            feed,
            settings,
            sku_map,
        } => cmd_run(marketplace, &feed, settings.as_deref(), sku_map.as_deref()).await,

        Commands::Plan {
            marketplace,
            feed,
            settings,
            sku_map,
        } => cmd_plan(marketplace, &feed, settings.as_deref(), sku_map.as_deref()),

        Commands::SettingsHash { settings } => {
            let settings = load_settings(settings.as_deref())?;
            println!("settings_hash={}", settings_hash(&settings)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_run(
    marketplace: Marketplace,
    feed: &Path,
    settings_path: Option<&Path>,
    sku_map: Option<&Path>,
) -> Result<ExitCode> {
    let settings = load_settings(settings_path)?;
    let lookup = load_sku_map(sku_map)?;
    let source = CsvFeedSource::new(feed);
    let (catalog, api, name) = build_marketplace(marketplace)?;

    let report = match run_sync(&source, catalog.as_ref(), &lookup, api, &settings).await {
        Ok(report) => report,
        Err(fetch_err) => {
            error!(marketplace = name, error = %fetch_err, "run aborted");
            RunReport::failed(
                Uuid::new_v4().to_string(),
                source.name().to_string(),
                name.to_string(),
                settings_hash(&settings)?,
                Utc::now(),
                fetch_err.to_string(),
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(exit_code_for(report.status))
}

fn cmd_plan(
    marketplace: Marketplace,
    feed: &Path,
    settings_path: Option<&Path>,
    sku_map: Option<&Path>,
) -> Result<ExitCode> {
    let settings = load_settings(settings_path)?;
    let lookup = load_sku_map(sku_map)?;
    let source = CsvFeedSource::new(feed);
    let (catalog, _api, _name) = build_marketplace(marketplace)?;

    let planned = gather_and_plan(&source, catalog.as_ref(), &lookup, &settings)?;
    let plan = serde_json::json!({
        "commands": planned.output.commands,
        "issues": planned.output.issues,
        "stats": planned.output.stats,
        "resolved": planned.resolved,
        "batches": planned.batches.len(),
        "settings_hash": settings_hash(&settings)?,
    });
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(ExitCode::SUCCESS)
}

/// Build the live catalog + update pair for one marketplace.
fn build_marketplace(
    marketplace: Marketplace,
) -> Result<(Box<dyn CatalogProvider>, Arc<dyn UpdateApi>, &'static str)> {
    match marketplace {
        Marketplace::Ozon => {
            let creds = resolve_ozon_credentials()?;
            let client = OzonClient::new(creds)?;
            Ok((
                Box::new(OzonCatalogProvider::new(client.clone())),
                Arc::new(OzonUpdateApi::new(client)),
                "ozon",
            ))
        }
        Marketplace::Yandex => {
            let creds = resolve_yandex_credentials()?;
            let client = YandexClient::new(creds)?;
            Ok((
                Box::new(YandexCatalogProvider::new(client.clone())),
                Arc::new(YandexUpdateApi::new(client)),
                "yandex",
            ))
        }
    }
}

/// Load an optional listing_id -> sku mapping CSV (headers: listing_id, sku).
fn load_sku_map(path: Option<&Path>) -> Result<SkuLookup> {
    let Some(path) = path else {
        return Ok(SkuLookup::new());
    };
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open sku map: {}", path.display()))?;
    let headers = rdr.headers().context("sku map headers")?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .with_context(|| format!("sku map missing column '{name}'"))
    };
    let listing_col = col("listing_id")?;
    let sku_col = col("sku")?;

    let mut lookup = SkuLookup::new();
    for (i, rec) in rdr.records().enumerate() {
        let row = i + 2;
        let rec = rec.with_context(|| format!("sku map row {row}"))?;
        let listing_id = rec.get(listing_col).unwrap_or("").trim().to_string();
        let sku = rec.get(sku_col).unwrap_or("").trim().to_string();
        if listing_id.is_empty() || sku.is_empty() {
            anyhow::bail!("sku map row {row}: empty listing_id or sku");
        }
        lookup.insert(listing_id, sku);
    }
    Ok(lookup)
}

fn exit_code_for(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Success => ExitCode::SUCCESS,
        RunStatus::Partial => ExitCode::from(1),
        RunStatus::Failed => ExitCode::from(2),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

// =============================================================================
// Market Snapshot — Main Entry Point
// =============================================================================
//
// Usage:
//   market-snapshot <symbol>        Create and persist a full snapshot
//   market-snapshot <symbol> info   Show basic info only
//
// Logs go to the configured log file; stdout carries only the report.
// =============================================================================

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{error, info, warn};

use market_snapshot::cli::{self, Command};
use market_snapshot::config::{SnapshotConfig, CONFIG_FILE};
use market_snapshot::display::{self, InfoView};
use market_snapshot::market_data::MarketDataSource;
use market_snapshot::{binance, logging, PersistedSnapshot, SnapshotAssembler, SnapshotStore};

#[tokio::main]
async fn main() -> ExitCode {
    // ── 1. Arguments ─────────────────────────────────────────────────────
    let command = cli::parse_args(std::env::args().skip(1));
    if command == Command::Help {
        println!("{}", cli::USAGE);
        return ExitCode::SUCCESS;
    }

    // ── 2. Environment, config & logging ─────────────────────────────────
    let _ = dotenv::dotenv();

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("\n  Error: {e:#}\n");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::setup_logging(&config) {
        println!("\n  Error: {e:#}\n");
        return ExitCode::FAILURE;
    }

    info!(command = ?command, base_url = %config.base_url, "market snapshot starting");

    // ── 3. Run ───────────────────────────────────────────────────────────
    let outcome = match &command {
        Command::Info { symbol } => cmd_info(symbol, &config).await,
        Command::Snapshot { symbol } => cmd_snapshot(symbol, &config).await,
        Command::Help => Ok(()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            println!("\n  Error: {e:#}\n");
            ExitCode::FAILURE
        }
    }
}

/// Config file (when present) with environment overrides on top.
fn load_config() -> Result<SnapshotConfig> {
    let mut config = if Path::new(CONFIG_FILE).exists() {
        SnapshotConfig::load(CONFIG_FILE)?
    } else {
        SnapshotConfig::default()
    };
    config
        .apply_env(|key| std::env::var(key).ok())
        .context("invalid environment override")?;
    Ok(config)
}

/// Lightweight view: 24h stats and top of book.
async fn cmd_info(symbol: &str, config: &SnapshotConfig) -> Result<()> {
    println!("{}", display::header(symbol, "info"));

    let view = binance::session(config, |client| async move {
        if !client.ping().await {
            anyhow::bail!("Cannot connect to Binance API");
        }

        let stats = client.ticker_24h(symbol).await?;
        let book = client.book_ticker(symbol).await?;

        let clock_offset_ms = match client.server_time().await {
            Ok(server_ms) => Some(server_ms - Local::now().timestamp_millis()),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "server time unavailable");
                None
            }
        };

        Ok(InfoView {
            stats,
            book,
            clock_offset_ms,
        })
    })
    .await??;

    print!("{}", display::render_info(&view));
    println!("{}", display::footer());
    Ok(())
}

/// Full snapshot, persisted under the configured directory.
async fn cmd_snapshot(symbol: &str, config: &SnapshotConfig) -> Result<()> {
    println!("{}", display::header(symbol, "snapshot"));

    let assembler = SnapshotAssembler::from_config(config);
    let assembler = &assembler;

    let persisted: PersistedSnapshot = binance::session(config, |client| async move {
        if !client.ping().await {
            anyhow::bail!("Cannot connect to Binance API");
        }

        println!("  Collecting data for {symbol}...\n");
        let persisted = assembler
            .create_snapshot(symbol, client.as_ref(), None)
            .await?;
        Ok(persisted)
    })
    .await??;

    // The file on disk must read back as the document just built.
    let reloaded = SnapshotStore::load(&persisted.path)?;
    if reloaded != persisted.document {
        anyhow::bail!(
            "snapshot at {} does not read back as written",
            persisted.path.display()
        );
    }

    print!("{}", display::render_snapshot(&persisted.document, &persisted.path));
    println!("{}", display::footer());
    Ok(())
}

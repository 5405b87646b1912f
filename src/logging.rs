// =============================================================================
// Logging — tracing subscriber writing to a file or stderr
// =============================================================================
//
// stdout belongs to the report, so log lines never go there. `RUST_LOG`
// overrides the configured level when set.
// =============================================================================

use std::fs::{create_dir_all, File};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::config::SnapshotConfig;

/// HTTP stack crates are only interesting when something is wrong.
const QUIET_DEPENDENCIES: &[&str] = &["reqwest=warn", "hyper=warn", "hyper_util=warn"];

/// Build the filter: `RUST_LOG` if set, otherwise the configured level.
fn build_filter(level: &str) -> EnvFilter {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    for directive in QUIET_DEPENDENCIES {
        if let Ok(d) = directive.parse::<Directive>() {
            filter = filter.add_directive(d);
        }
    }
    filter
}

/// Install the global subscriber described by `cfg`.
pub fn setup_logging(cfg: &SnapshotConfig) -> Result<()> {
    let filter = build_filter(&cfg.log_level);

    if cfg.log_file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let path = Path::new(&cfg.log_file);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)
            .with_context(|| format!("could not create log directory {}", dir.display()))?;
    }

    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

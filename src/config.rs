// =============================================================================
// Snapshot Configuration — endpoint, timeouts, output and log locations
// =============================================================================
//
// Passed explicitly to the Binance client, the assembler and the logging
// setup; nothing reads process-wide defaults behind the caller's back.
//
// Loading order: JSON file (optional), then environment overrides. All
// fields carry `#[serde(default)]` so a partial file is always accepted.
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default location of the optional configuration file.
pub const CONFIG_FILE: &str = "snapshot_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/market_snapshot.log".to_string()
}

// =============================================================================
// SnapshotConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Base URL of the public REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound applied to every individual request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory snapshots are written to when the caller does not name one.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log file path. Empty means log to stderr.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            snapshot_dir: default_snapshot_dir(),
            log_level: default_log_level(),
            log_file: default_log_file(),
        }
    }
}

impl SnapshotConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot config from {}", path.display()))?;

        info!(
            path = %path.display(),
            base_url = %config.base_url,
            "snapshot config loaded"
        );

        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests never touch the real process
    /// environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BINANCE_BASE_URL") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        if let Some(dir) = lookup("SNAPSHOT_DIR") {
            self.snapshot_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        if let Some(file) = lookup("LOG_FILE") {
            self.log_file = file;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = SnapshotConfig::default();
        assert_eq!(cfg.base_url, "https://api.binance.com");
        assert_eq!(cfg.request_timeout_secs, 10);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.snapshot_dir, PathBuf::from("snapshots"));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: SnapshotConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, SnapshotConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "request_timeout_secs": 3, "snapshot_dir": "/tmp/snaps" }"#;
        let cfg: SnapshotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.request_timeout_secs, 3);
        assert_eq!(cfg.snapshot_dir, PathBuf::from("/tmp/snaps"));
        assert_eq!(cfg.base_url, "https://api.binance.com");
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("BINANCE_BASE_URL", "http://localhost:9000/"),
            ("REQUEST_TIMEOUT_SECS", "4"),
            ("LOG_LEVEL", "DEBUG"),
            ("LOG_FILE", ""),
        ]
        .into_iter()
        .collect();

        let mut cfg = SnapshotConfig::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.base_url, "http://localhost:9000");
        assert_eq!(cfg.request_timeout_secs, 4);
        assert_eq!(cfg.log_level, "debug");
        assert!(cfg.log_file.is_empty());
        assert_eq!(cfg.snapshot_dir, PathBuf::from("snapshots"));
    }

    #[test]
    fn bad_timeout_override_is_an_error() {
        let mut cfg = SnapshotConfig::default();
        let res = cfg.apply_env(|k| (k == "REQUEST_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert!(res.is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "base_url": "http://127.0.0.1:8080", "log_file": "" }"#).unwrap();

        let cfg = SnapshotConfig::load(&path).unwrap();
        assert_eq!(cfg.base_url, "http://127.0.0.1:8080");
        assert!(cfg.log_file.is_empty());
        assert_eq!(cfg.request_timeout_secs, 10);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SnapshotConfig::load(dir.path().join("absent.json")).is_err());
    }
}

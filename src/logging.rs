//! Subscriber setup for the `cinescribe` binary.
//!
//! The library only emits `tracing` events. The binary routes them to the
//! systemd journal when one is reachable and to `cinescribe.log.<date>` files
//! otherwise.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::paths;

const LOG_ENV: &str = "CINESCRIBE_LOG";
const DEFAULT_DIRECTIVE: &str = "info";
const LOG_FILE_PREFIX: &str = "cinescribe.log";

/// Keeps the non-blocking writer flushing until the process exits.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// `~/.cinescribe/logs`, or `./logs` when there is no home directory.
pub fn default_log_dir() -> PathBuf {
    paths::app_data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

#[cfg(target_os = "linux")]
fn init_journald() -> bool {
    match tracing_journald::layer() {
        Ok(layer) => tracing_subscriber::registry()
            .with(env_filter())
            .with(layer)
            .try_init()
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(not(target_os = "linux"))]
fn init_journald() -> bool {
    false
}

fn init_file(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("A global tracing subscriber is already installed")?;
    Ok(())
}

/// Install the global subscriber. Call once, early in `main`.
///
/// `log_dir` overrides [`default_log_dir`] for the file backend.
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    if init_journald() {
        tracing::info!(backend = "journald", "Logging initialized");
        return Ok(());
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    init_file(&log_dir)?;
    tracing::info!(backend = "file", log_dir = ?log_dir, "Logging initialized");
    Ok(())
}

//! Tracing setup.
//!
//! The terminal UI owns stdout, so events go to a daily rolling file under
//! the data directory instead.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "perimap=info";

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered events are flushed.
pub fn init(log_dir: Option<&Path>) -> Result<WorkerGuard> {
  let dir = match log_dir {
    Some(dir) => dir.to_path_buf(),
    None => default_dir()?,
  };
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "perimap.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter())
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env("PERIMAP_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn default_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("perimap").join("logs"))
}

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cache::{CacheSettings, DAY_MS, DEFAULT_MAX_ENTRIES};

/// Number of trips shown by the recent-journeys panel by default.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub recent: RecentConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
  /// Persist journeys in a SQLite file under the data directory
  #[default]
  Sqlite,
  /// Keep journeys for the current process only
  Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  #[serde(default = "default_max_entries")]
  pub max_entries: usize,
  #[serde(default = "default_ttl_days")]
  pub ttl_days: u32,
  #[serde(default)]
  pub backend: StorageBackend,
  /// SQLite file location (default: $XDG_DATA_HOME/perimap/cache.db)
  pub db_path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      max_entries: default_max_entries(),
      ttl_days: default_ttl_days(),
      backend: StorageBackend::default(),
      db_path: None,
    }
  }
}

impl CacheConfig {
  pub fn settings(&self) -> CacheSettings {
    CacheSettings {
      max_entries: self.max_entries,
      ttl_ms: i64::from(self.ttl_days) * DAY_MS,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentConfig {
  #[serde(default = "default_recent_limit")]
  pub limit: usize,
}

impl Default for RecentConfig {
  fn default() -> Self {
    Self {
      limit: default_recent_limit(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
  /// Directory for log files (default: $XDG_DATA_HOME/perimap/logs)
  pub dir: Option<PathBuf>,
}

fn default_max_entries() -> usize {
  DEFAULT_MAX_ENTRIES
}

fn default_ttl_days() -> u32 {
  7
}

fn default_recent_limit() -> usize {
  DEFAULT_RECENT_LIMIT
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./perimap.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/perimap/config.yaml
  ///
  /// Without any file the defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("perimap.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("perimap").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn validate(&self) -> Result<()> {
    if self.cache.max_entries == 0 {
      return Err(eyre!("cache.max_entries must be at least 1"));
    }
    if self.cache.ttl_days == 0 {
      return Err(eyre!("cache.ttl_days must be at least 1"));
    }
    if self.recent.limit == 0 {
      return Err(eyre!("recent.limit must be at least 1"));
    }
    Ok(())
  }
}

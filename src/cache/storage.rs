//! Slot storage trait and its SQLite, in-memory and disabled implementations.
//!
//! A slot is a single string value under a string key, the same contract a
//! browser's local storage offers. The journey cache keeps its whole
//! collection in one slot and rewrites it after every mutation.

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Faults raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
  /// The medium is disabled or cannot be reached at all
  #[error("storage unavailable: {0}")]
  Unavailable(String),
  /// The medium rejected a write because it is full
  #[error("storage quota exceeded writing {needed} bytes to slot '{slot}'")]
  QuotaExceeded { slot: String, needed: usize },
  /// Any other backend failure
  #[error("storage backend error: {0}")]
  Backend(String),
}

/// Synchronous key/value storage for cache slots.
pub trait SlotStorage: Send + Sync {
  /// Read the raw value stored under `slot`.
  fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError>;

  /// Replace the value stored under `slot`.
  fn write_slot(&self, slot: &str, value: &str) -> Result<(), StorageError>;

  /// Delete `slot`. Removing a missing slot is not an error.
  fn remove_slot(&self, slot: &str) -> Result<(), StorageError>;
}

/// Storage used when persistence is disabled.
/// Every call fails with `Unavailable`, which makes the cache memory-only.
pub struct NoopStorage;

impl SlotStorage for NoopStorage {
  fn read_slot(&self, _slot: &str) -> Result<Option<String>, StorageError> {
    Err(StorageError::Unavailable("persistence disabled".to_string()))
  }

  fn write_slot(&self, _slot: &str, _value: &str) -> Result<(), StorageError> {
    Err(StorageError::Unavailable("persistence disabled".to_string()))
  }

  fn remove_slot(&self, _slot: &str) -> Result<(), StorageError> {
    Err(StorageError::Unavailable("persistence disabled".to_string()))
  }
}

/// In-process storage with an optional byte quota across all slots.
#[derive(Default)]
pub struct MemoryStorage {
  slots: Mutex<HashMap<String, String>>,
  quota_bytes: Option<usize>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reject writes that would push the total stored bytes past `quota_bytes`.
  pub fn with_quota(quota_bytes: usize) -> Self {
    Self {
      slots: Mutex::new(HashMap::new()),
      quota_bytes: Some(quota_bytes),
    }
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
    self
      .slots
      .lock()
      .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))
  }
}

impl SlotStorage for MemoryStorage {
  fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
    Ok(self.lock()?.get(slot).cloned())
  }

  fn write_slot(&self, slot: &str, value: &str) -> Result<(), StorageError> {
    let mut slots = self.lock()?;

    if let Some(quota) = self.quota_bytes {
      let others: usize = slots
        .iter()
        .filter(|(k, _)| k.as_str() != slot)
        .map(|(_, v)| v.len())
        .sum();
      if others + value.len() > quota {
        return Err(StorageError::QuotaExceeded {
          slot: slot.to_string(),
          needed: value.len(),
        });
      }
    }

    slots.insert(slot.to_string(), value.to_string());
    Ok(())
  }

  fn remove_slot(&self, slot: &str) -> Result<(), StorageError> {
    self.lock()?.remove(slot);
    Ok(())
  }
}

/// SQLite-backed slot storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the slot database at the default location.
  pub fn open() -> Result<Self, StorageError> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open (or create) the slot database at `path`.
  pub fn open_at(path: &Path) -> Result<Self, StorageError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StorageError::Unavailable(format!("Failed to create cache directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      StorageError::Unavailable(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StorageError::Unavailable("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("perimap").join("cache.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
    self
      .conn
      .lock()
      .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))
  }

  fn run_migrations(&self) -> Result<(), StorageError> {
    self
      .lock()?
      .execute_batch(SLOT_SCHEMA)
      .map_err(|e| StorageError::Backend(format!("Failed to run cache migrations: {}", e)))
  }
}

/// Schema for the slot table.
const SLOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    slot_key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SlotStorage for SqliteStorage {
  fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
    let conn = self.lock()?;

    conn
      .query_row(
        "SELECT value FROM slots WHERE slot_key = ?",
        params![slot],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| classify(e, slot, 0))
  }

  fn write_slot(&self, slot: &str, value: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO slots (slot_key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![slot, value],
      )
      .map_err(|e| classify(e, slot, value.len()))?;

    Ok(())
  }

  fn remove_slot(&self, slot: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM slots WHERE slot_key = ?", params![slot])
      .map_err(|e| classify(e, slot, 0))?;

    Ok(())
  }
}

/// Map a SQLite failure onto the storage fault taxonomy.
fn classify(err: rusqlite::Error, slot: &str, needed: usize) -> StorageError {
  match err.sqlite_error_code() {
    Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
      slot: slot.to_string(),
      needed,
    },
    Some(ErrorCode::CannotOpen)
    | Some(ErrorCode::ReadOnly)
    | Some(ErrorCode::PermissionDenied) => StorageError::Unavailable(err.to_string()),
    // Busy and locked are transient contention from another process on the same file
    _ => StorageError::Backend(err.to_string()),
  }
}

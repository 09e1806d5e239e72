//! Decoding and validation of the persisted journey collection.
//!
//! The slot value is a JSON array of journey entries. A payload either
//! passes every check and loads whole, or is rejected whole; individual
//! entries are never salvaged out of a bad payload.

use std::collections::HashSet;
use thiserror::Error;

use crate::journey::{is_hex_color, JourneyEntry};

use super::key::normalize_key;

/// Why a persisted payload was rejected.
#[derive(Debug, Error)]
pub enum PayloadError {
  #[error("malformed payload: {0}")]
  Json(#[from] serde_json::Error),
  #[error("malformed payload: entry {index}: {reason}")]
  Shape { index: usize, reason: String },
}

/// Parse and validate a raw slot value.
pub fn decode(raw: &str) -> Result<Vec<JourneyEntry>, PayloadError> {
  let entries: Vec<JourneyEntry> = serde_json::from_str(raw)?;
  validate(&entries)?;
  Ok(entries)
}

/// Serialize the collection for writing back to the slot.
pub fn encode(entries: &[JourneyEntry]) -> Result<String, PayloadError> {
  Ok(serde_json::to_string(entries)?)
}

/// Check the invariants a loaded collection must hold.
pub fn validate(entries: &[JourneyEntry]) -> Result<(), PayloadError> {
  let mut seen = HashSet::new();

  for (index, entry) in entries.iter().enumerate() {
    let shape = |reason: String| PayloadError::Shape { index, reason };

    if entry.key.is_empty() {
      return Err(shape("empty key".to_string()));
    }
    let expected = normalize_key(&entry.from_name, &entry.to_name);
    if entry.key != expected {
      return Err(shape(format!(
        "key '{}' does not match endpoints (expected '{}')",
        entry.key, expected
      )));
    }
    if !seen.insert(entry.key.as_str()) {
      return Err(shape(format!("duplicate key '{}'", entry.key)));
    }
    if entry.access_count < 1 {
      return Err(shape("accessCount must be at least 1".to_string()));
    }
    if entry.expires_at < entry.saved_at {
      return Err(shape("expiresAt precedes savedAt".to_string()));
    }
    for segment in &entry.summary.segments {
      if !is_hex_color(&segment.color) || !is_hex_color(&segment.text_color) {
        return Err(shape(format!(
          "segment '{}' has a non-hex color",
          segment.name
        )));
      }
    }
  }

  Ok(())
}

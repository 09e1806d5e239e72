//! Bounded, expiring store of journey summaries persisted in one slot.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::journey::{JourneyEntry, Summary};

use super::clock::Clock;
use super::key::normalize_key;
use super::payload;
use super::storage::{SlotStorage, StorageError};

/// Slot holding the current journey collection. The suffix is the layout version.
pub const SLOT_KEY: &str = "perimap_journeys_v3";

/// Slots written by older layouts. They are never read, only discarded.
pub const LEGACY_SLOT_KEYS: &[&str] = &[
  "perimap_journeys_v1",
  "perimap_journeys_v2",
  "perimap_recent_journeys",
];

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
pub const DEFAULT_TTL_MS: i64 = 7 * DAY_MS;
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Capacity and freshness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
  /// Upper bound on stored entries (at least 1)
  pub max_entries: usize,
  /// Lifetime of an entry from its last write (at least 1ms)
  pub ttl_ms: i64,
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      max_entries: DEFAULT_MAX_ENTRIES,
      ttl_ms: DEFAULT_TTL_MS,
    }
  }
}

/// A routing result ready to be written into the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJourney {
  pub from_name: String,
  pub to_name: String,
  pub departure_time: String,
  pub summary: Summary,
  pub full_itinerary: Option<Value>,
  pub search_time: Option<String>,
}

impl NewJourney {
  pub fn new(
    from_name: impl Into<String>,
    to_name: impl Into<String>,
    departure_time: impl Into<String>,
    summary: Summary,
  ) -> Self {
    Self {
      from_name: from_name.into(),
      to_name: to_name.into(),
      departure_time: departure_time.into(),
      summary,
      full_itinerary: None,
      search_time: None,
    }
  }

  pub fn with_itinerary(mut self, itinerary: Value) -> Self {
    self.full_itinerary = Some(itinerary);
    self
  }

  pub fn with_search_time(mut self, search_time: impl Into<String>) -> Self {
    self.search_time = Some(search_time.into());
    self
  }
}

/// Session counters and occupancy.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
  /// Live (unexpired) entries
  pub entries: usize,
  pub max_entries: usize,
  pub hits: u64,
  pub misses: u64,
  /// Hits as a percentage of lookups, 0 when there were none
  pub hit_rate: f64,
  /// False once the cache has fallen back to memory-only operation
  pub persistent: bool,
}

/// Journey cache for one application context.
///
/// The whole collection is loaded from the slot on first use and written
/// back after every mutation. Storage faults never reach the caller: a failed
/// read starts the session cold, a failed write leaves the in-memory state
/// authoritative, and an unavailable medium turns the cache memory-only for
/// the rest of its life.
///
/// Nothing coordinates two processes sharing the same slot; the last writer
/// wins.
pub struct JourneyCache {
  storage: Arc<dyn SlotStorage>,
  clock: Arc<dyn Clock>,
  settings: CacheSettings,
  /// Stored order, not sorted by any field
  entries: Vec<JourneyEntry>,
  loaded: bool,
  persistent: bool,
  hits: u64,
  misses: u64,
}

impl JourneyCache {
  /// Create a cache over `storage` and discard slots left by older layouts.
  ///
  /// The current slot itself is not read until the first operation.
  pub fn open(
    storage: Arc<dyn SlotStorage>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
  ) -> Self {
    let settings = CacheSettings {
      max_entries: settings.max_entries.max(1),
      ttl_ms: settings.ttl_ms.max(1),
    };

    let mut cache = Self {
      storage,
      clock,
      settings,
      entries: Vec::new(),
      loaded: false,
      persistent: true,
      hits: 0,
      misses: 0,
    };
    cache.discard_legacy_slots();
    cache
  }

  pub fn settings(&self) -> CacheSettings {
    self.settings
  }

  /// Current time on the cache's clock, epoch milliseconds.
  pub fn now_ms(&self) -> i64 {
    self.clock.now_ms()
  }

  /// Whether writes still reach the storage medium.
  pub fn is_persistent(&self) -> bool {
    self.persistent
  }

  /// Look up a live entry by endpoint names.
  ///
  /// An expired match is removed and reported as a miss. On a hit the
  /// stored access count is bumped and persisted; the returned entry is the
  /// state as it was found, before the bump.
  pub fn get(&mut self, from_name: &str, to_name: &str) -> Option<JourneyEntry> {
    self.load_if_needed();
    let key = normalize_key(from_name, to_name);
    let now = self.clock.now_ms();

    let Some(index) = self.position(&key) else {
      self.misses += 1;
      debug!(key = %key, "Journey cache miss");
      return None;
    };

    if self.entries[index].is_expired_at(now) {
      self.entries.remove(index);
      self.misses += 1;
      debug!(key = %key, "Expired journey dropped on read");
      self.persist();
      return None;
    }

    let found = self.entries[index].clone();
    let entry = &mut self.entries[index];
    entry.access_count = entry.access_count.saturating_add(1);
    self.hits += 1;
    debug!(key = %key, access_count = entry.access_count, "Journey cache hit");
    self.persist();

    Some(found)
  }

  /// Write a routing result, replacing any entry with the same key.
  ///
  /// A replaced entry restarts from scratch: new write time, new expiry,
  /// and an access count of 1. Segment colors are coerced to hex so the
  /// written slot always loads back.
  pub fn put(&mut self, journey: NewJourney) -> JourneyEntry {
    self.load_if_needed();
    let key = normalize_key(&journey.from_name, &journey.to_name);
    let now = self.clock.now_ms();
    let expires_at = now.saturating_add(self.settings.ttl_ms);

    let entry = JourneyEntry {
      key,
      from_name: journey.from_name,
      to_name: journey.to_name,
      departure_time: journey.departure_time,
      summary: journey.summary.with_hex_colors(),
      full_itinerary: journey.full_itinerary,
      search_time: journey.search_time,
      saved_at: now,
      expires_at,
      access_count: 1,
    };

    if let Some(index) = self.position(&entry.key) {
      debug!(key = %entry.key, "Replacing cached journey");
      self.entries[index] = entry.clone();
    } else {
      self.evict_if_needed(now);
      debug!(key = %entry.key, "Caching new journey");
      self.entries.push(entry.clone());
    }

    self.persist();
    entry
  }

  /// Live entries, most recently saved first, at most `limit` of them.
  ///
  /// Expired entries found on the way are removed. Access counts are left
  /// untouched.
  pub fn list_recent(&mut self, limit: usize) -> Vec<JourneyEntry> {
    self.load_if_needed();
    let now = self.clock.now_ms();
    if self.drop_expired(now) > 0 {
      self.persist();
    }

    let mut recent = self.entries.clone();
    recent.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
    recent.truncate(limit);
    recent
  }

  /// Remove every expired entry and return how many were removed.
  pub fn clear_expired(&mut self) -> usize {
    self.load_if_needed();
    let now = self.clock.now_ms();
    let removed = self.drop_expired(now);
    if removed > 0 {
      info!(removed, "Cleared expired journeys");
      self.persist();
    }
    removed
  }

  /// Remove one entry by endpoint names. Returns whether anything was removed.
  pub fn remove(&mut self, from_name: &str, to_name: &str) -> bool {
    self.load_if_needed();
    let key = normalize_key(from_name, to_name);

    match self.position(&key) {
      Some(index) => {
        self.entries.remove(index);
        debug!(key = %key, "Removed cached journey");
        self.persist();
        true
      }
      None => false,
    }
  }

  /// Attach the full routing response to a live entry.
  ///
  /// Write time, expiry and access count are kept. Returns false when there
  /// is no live entry for the pair.
  pub fn attach_itinerary(&mut self, from_name: &str, to_name: &str, itinerary: Value) -> bool {
    self.load_if_needed();
    let key = normalize_key(from_name, to_name);
    let now = self.clock.now_ms();

    let Some(index) = self.position(&key) else {
      return false;
    };

    if self.entries[index].is_expired_at(now) {
      self.entries.remove(index);
      self.persist();
      return false;
    }

    self.entries[index].full_itinerary = Some(itinerary);
    debug!(key = %key, "Attached itinerary to cached journey");
    self.persist();
    true
  }

  /// Forget everything and delete the slot. Safe to call repeatedly.
  pub fn reset(&mut self) {
    self.entries.clear();
    self.loaded = true;

    if self.persistent {
      if let Err(e) = self.storage.remove_slot(SLOT_KEY) {
        self.note_storage_fault(&e);
      }
    }
    info!("Journey cache reset");
  }

  /// Entries in stored order, expired ones included.
  pub fn entries(&mut self) -> &[JourneyEntry] {
    self.load_if_needed();
    &self.entries
  }

  pub fn stats(&mut self) -> CacheStats {
    self.load_if_needed();
    let now = self.clock.now_ms();
    let lookups = self.hits + self.misses;
    let hit_rate = if lookups == 0 {
      0.0
    } else {
      self.hits as f64 * 100.0 / lookups as f64
    };

    CacheStats {
      entries: self.entries.iter().filter(|e| !e.is_expired_at(now)).count(),
      max_entries: self.settings.max_entries,
      hits: self.hits,
      misses: self.misses,
      hit_rate,
      persistent: self.persistent,
    }
  }

  /// Make room for one insertion.
  ///
  /// Expired entries go first. If the cache is still full, the oldest writes
  /// are dropped until one slot is free; among equal write times the less
  /// used entry goes first.
  fn evict_if_needed(&mut self, now: i64) -> usize {
    let max = self.settings.max_entries;
    if self.entries.len() < max {
      return 0;
    }

    let before = self.entries.len();
    self.drop_expired(now);

    if self.entries.len() >= max {
      let excess = self.entries.len() + 1 - max;
      let mut order: Vec<usize> = (0..self.entries.len()).collect();
      order.sort_by_key(|&i| (self.entries[i].saved_at, self.entries[i].access_count));
      let doomed: HashSet<usize> = order.into_iter().take(excess).collect();

      let mut index = 0;
      self.entries.retain(|_| {
        let keep = !doomed.contains(&index);
        index += 1;
        keep
      });
    }

    let evicted = before - self.entries.len();
    if evicted > 0 {
      debug!(evicted, max_entries = max, "Evicted journeys to stay within capacity");
    }
    evicted
  }

  fn drop_expired(&mut self, now: i64) -> usize {
    let before = self.entries.len();
    self.entries.retain(|e| !e.is_expired_at(now));
    before - self.entries.len()
  }

  fn position(&self, key: &str) -> Option<usize> {
    self.entries.iter().position(|e| e.key == key)
  }

  fn load_if_needed(&mut self) {
    if self.loaded {
      return;
    }
    self.loaded = true;

    if !self.persistent {
      return;
    }

    self.entries = match self.storage.read_slot(SLOT_KEY) {
      Ok(Some(raw)) => match payload::decode(&raw) {
        Ok(entries) => {
          debug!(count = entries.len(), "Loaded journey cache");
          entries
        }
        Err(e) => {
          warn!(error = %e, "Discarding unreadable journey cache");
          Vec::new()
        }
      },
      Ok(None) => Vec::new(),
      Err(e) => {
        self.note_storage_fault(&e);
        Vec::new()
      }
    };
  }

  fn persist(&mut self) {
    if !self.persistent {
      return;
    }

    let raw = match payload::encode(&self.entries) {
      Ok(raw) => raw,
      Err(e) => {
        error!(error = %e, "Failed to serialize journey cache");
        return;
      }
    };

    if let Err(e) = self.storage.write_slot(SLOT_KEY, &raw) {
      self.note_storage_fault(&e);
    }
  }

  fn discard_legacy_slots(&mut self) {
    for slot in LEGACY_SLOT_KEYS {
      if let Err(e) = self.storage.remove_slot(slot) {
        self.note_storage_fault(&e);
        return;
      }
    }
  }

  fn note_storage_fault(&mut self, err: &StorageError) {
    match err {
      StorageError::Unavailable(_) => {
        if self.persistent {
          warn!(error = %err, "Journey cache storage unavailable, keeping journeys in memory only");
        }
        self.persistent = false;
      }
      StorageError::QuotaExceeded { .. } => {
        warn!(error = %err, "Journey cache write dropped");
      }
      StorageError::Backend(_) => {
        error!(error = %err, "Journey cache storage failure");
      }
    }
  }
}

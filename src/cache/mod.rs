//! Client-side journey cache.
//!
//! This module provides a bounded, expiring store of journey summaries that:
//! - Addresses entries by a normalized origin/destination key
//! - Keeps the whole collection in a single storage slot, rewritten on every change
//! - Expires entries lazily when they are read or listed
//! - Evicts the oldest writes when full, sparing popular routes on ties
//! - Falls back to memory-only operation when storage misbehaves

mod clock;
mod journeys;
mod key;
mod payload;
pub mod seed;
mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use journeys::{
  CacheSettings, CacheStats, JourneyCache, NewJourney, DAY_MS, DEFAULT_MAX_ENTRIES,
  DEFAULT_TTL_MS, LEGACY_SLOT_KEYS, SLOT_KEY,
};
pub use key::{normalize_key, KEY_SEPARATOR};
pub use payload::{decode, encode, PayloadError};
pub use storage::{MemoryStorage, NoopStorage, SlotStorage, SqliteStorage, StorageError};

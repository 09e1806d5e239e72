//! Time source for expiry and ordering.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
  fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_ms(&self) -> i64 {
    Utc::now().timestamp_millis()
  }
}

/// Clock that only moves when told to.
///
/// Clones share the same instant, so a test can hand one clone to a
/// `JourneyCache` and advance time through another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  now: Arc<AtomicI64>,
}

impl ManualClock {
  pub fn new(now_ms: i64) -> Self {
    Self {
      now: Arc::new(AtomicI64::new(now_ms)),
    }
  }

  pub fn set(&self, now_ms: i64) {
    self.now.store(now_ms, Ordering::SeqCst);
  }

  pub fn advance(&self, delta_ms: i64) {
    self.now.fetch_add(delta_ms, Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now_ms(&self) -> i64 {
    self.now.load(Ordering::SeqCst)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_manual_clock_clones_share_time() {
    let clock = ManualClock::new(100);
    let handle = clock.clone();

    handle.advance(50);
    assert_eq!(clock.now_ms(), 150);

    handle.set(10);
    assert_eq!(clock.now_ms(), 10);
  }

  #[test]
  fn test_system_clock_is_after_2020() {
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
  }
}

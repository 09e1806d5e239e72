//! Journey cache behaviour through the public API, backed by an on-disk slot.

use perimap::cache::{
  normalize_key, seed, CacheSettings, JourneyCache, ManualClock, NewJourney, SlotStorage,
  SqliteStorage, DAY_MS, SLOT_KEY,
};
use perimap::journey::{Segment, Summary, TripType};
use std::sync::Arc;
use tempfile::TempDir;

const T0: i64 = 1_700_000_000_000;
const MINUTE_MS: i64 = 60 * 1000;

fn create_test_storage() -> (Arc<SqliteStorage>, TempDir) {
  let temp_dir = TempDir::new().expect("Failed to create temp directory");
  let storage = SqliteStorage::open_at(&temp_dir.path().join("cache.db"))
    .expect("SQLite storage should open");
  (Arc::new(storage), temp_dir)
}

fn open(storage: &Arc<SqliteStorage>, clock: &ManualClock, max_entries: usize) -> JourneyCache {
  JourneyCache::open(
    storage.clone(),
    Arc::new(clock.clone()),
    CacheSettings {
      max_entries,
      ..CacheSettings::default()
    },
  )
}

fn republique_to_clinique() -> NewJourney {
  NewJourney::new(
    "République",
    "Clinique Saint Pierre",
    "Maintenant",
    Summary {
      trip_type: TripType::Bus,
      duration: "22 min".to_string(),
      segments: vec![Segment::new("B", "#E91E63", "#FFFFFF")],
      has_walk: false,
    },
  )
}

fn simple(from: &str, to: &str) -> NewJourney {
  NewJourney::new(
    from,
    to,
    "Maintenant",
    Summary {
      trip_type: TripType::Walk,
      duration: "9 min".to_string(),
      segments: Vec::new(),
      has_walk: true,
    },
  )
}

#[test]
fn normalization_ignores_case_and_surrounding_space() {
  assert_eq!(
    normalize_key("Gare De Perpignan", "Aéroport"),
    normalize_key("  gare de perpignan  ", "aéroport")
  );
}

#[test]
fn entry_expires_exactly_at_ttl() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut cache = open(&storage, &clock, 10);
  cache.put(republique_to_clinique());

  clock.set(T0 + 7 * DAY_MS - MINUTE_MS);
  assert!(cache.get("République", "Clinique Saint Pierre").is_some());

  clock.set(T0 + 7 * DAY_MS);
  assert!(cache.get("République", "Clinique Saint Pierre").is_none());
}

#[test]
fn successive_gets_count_and_listing_does_not() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut cache = open(&storage, &clock, 10);
  cache.put(republique_to_clinique());

  let counts: Vec<u32> = (0..3)
    .map(|_| {
      let seen = cache.list_recent(5)[0].access_count;
      let got = cache.get("République", "Clinique Saint Pierre").unwrap();
      assert_eq!(got.access_count, seen);
      got.access_count
    })
    .collect();

  assert_eq!(counts, vec![1, 2, 3]);
}

#[test]
fn put_on_popular_entry_resets_count_and_expiry() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut cache = open(&storage, &clock, 10);
  cache.put(republique_to_clinique());
  for _ in 0..4 {
    cache.get("République", "Clinique Saint Pierre");
  }
  assert_eq!(cache.list_recent(1)[0].access_count, 5);

  clock.advance(DAY_MS);
  let entry = cache.put(republique_to_clinique());

  assert_eq!(entry.access_count, 1);
  assert_eq!(entry.expires_at, T0 + 8 * DAY_MS);
}

#[test]
fn capacity_eviction_removes_oldest_then_least_used() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut cache = open(&storage, &clock, 3);

  // Two entries share the oldest write time; "Used" is more popular
  cache.put(simple("Used", "Stop"));
  cache.put(simple("Unused", "Stop"));
  cache.get("Used", "Stop");
  clock.advance(MINUTE_MS);
  cache.put(simple("Newer", "Stop"));
  clock.advance(MINUTE_MS);

  cache.put(simple("Incoming", "Stop"));
  let names: Vec<String> = cache
    .list_recent(10)
    .into_iter()
    .map(|e| e.from_name)
    .collect();
  assert_eq!(names, vec!["Incoming", "Newer", "Used"]);

  clock.advance(MINUTE_MS);
  cache.put(simple("Another", "Stop"));
  let names: Vec<String> = cache
    .list_recent(10)
    .into_iter()
    .map(|e| e.from_name)
    .collect();
  assert_eq!(names, vec!["Another", "Incoming", "Newer"]);
}

#[test]
fn corrupt_payloads_read_as_empty() {
  let payloads = [
    "not json at all",
    "{\"key\": \"a|b\"}",
    "[1, 2, 3]",
    "[{\"key\": \"a|b\", \"fromName\": \"a\"}]",
    "null",
  ];

  for payload in payloads {
    let (storage, _dir) = create_test_storage();
    storage.write_slot(SLOT_KEY, payload).unwrap();

    let mut cache = open(&storage, &ManualClock::new(T0), 10);
    assert!(
      cache.list_recent(5).is_empty(),
      "payload {:?} should be discarded",
      payload
    );
  }
}

#[test]
fn end_to_end_lookup_is_order_sensitive() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut cache = open(&storage, &clock, 10);
  cache.put(republique_to_clinique());

  assert!(cache.get("CLINIQUE SAINT PIERRE", "république").is_none());

  let entry = cache
    .get("République", "Clinique Saint Pierre")
    .expect("forward lookup should hit");
  assert_eq!(entry.access_count, 1);
  assert_eq!(entry.summary.duration, "22 min");
  assert_eq!(entry.summary.segments[0].color, "#E91E63");
}

#[test]
fn state_survives_a_new_session_on_the_same_slot() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  {
    let mut cache = open(&storage, &clock, 10);
    cache.put(republique_to_clinique());
    cache.get("République", "Clinique Saint Pierre");
  }

  let mut cache = open(&storage, &clock, 10);
  let recent = cache.list_recent(5);
  assert_eq!(recent.len(), 1);
  assert_eq!(recent[0].access_count, 2);
}

#[test]
fn bare_gtfs_colors_do_not_poison_the_slot() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  {
    let mut cache = open(&storage, &clock, 10);
    cache.put(republique_to_clinique());
    cache.put(simple("Castillet", "Université"));
    let mut gtfs = simple("Gare de Perpignan", "Université");
    gtfs.summary.segments = vec![Segment::new("C", "E91E63", "FFFFFF")];
    cache.put(gtfs);
  }

  let mut cache = open(&storage, &clock, 10);
  assert_eq!(cache.list_recent(10).len(), 3);
  let entry = cache
    .get("Gare de Perpignan", "Université")
    .expect("entry should load in the next session");
  assert_eq!(
    entry.summary.segments[0],
    Segment::new("C", "#E91E63", "#FFFFFF")
  );
}

#[test]
fn stale_snapshot_overwrites_peer_on_next_put() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut first = open(&storage, &clock, 10);
  let mut second = open(&storage, &clock, 10);

  // Both sessions load the empty slot before either writes
  assert!(first.list_recent(5).is_empty());
  assert!(second.list_recent(5).is_empty());

  first.put(simple("First", "Tab"));
  second.put(simple("Second", "Tab"));

  let mut reader = open(&storage, &clock, 10);
  let names: Vec<String> = reader
    .list_recent(5)
    .into_iter()
    .map(|e| e.from_name)
    .collect();
  assert_eq!(names, vec!["Second"]);
}

#[test]
fn seeded_slot_is_readable_by_the_cache() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  seed::write_demo_slot(storage.as_ref(), T0, true).unwrap();

  let mut cache = open(&storage, &clock, 10);
  let recent = cache.list_recent(5);
  assert_eq!(recent.len(), 3);
  assert_eq!(recent[0].from_name, "Gare de Perpignan");

  let hit = cache.get("castillet", "université").expect("seeded entry");
  assert_eq!(hit.access_count, 5);
  assert!(hit.full_itinerary.is_some());
}

#[test]
fn reset_and_clear_expired_are_idempotent() {
  let (storage, _dir) = create_test_storage();
  let clock = ManualClock::new(T0);
  let mut cache = open(&storage, &clock, 10);
  cache.put(simple("A", "B"));
  clock.advance(8 * DAY_MS);

  assert_eq!(cache.clear_expired(), 1);
  assert_eq!(cache.clear_expired(), 0);

  cache.put(simple("C", "D"));
  cache.reset();
  cache.reset();
  assert!(storage.read_slot(SLOT_KEY).unwrap().is_none());
  assert!(cache.list_recent(5).is_empty());
}

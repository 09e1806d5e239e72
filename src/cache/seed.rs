//! Demo journeys for filling an empty slot during development.

use serde_json::{json, Value};

use crate::journey::{JourneyEntry, Segment, Summary, TripType, DEFAULT_DEPARTURE};

use super::journeys::{DEFAULT_TTL_MS, SLOT_KEY};
use super::key::normalize_key;
use super::payload;
use super::storage::{SlotStorage, StorageError};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// The three demo journeys, saved one hour apart ending at `now_ms`.
///
/// With `with_itineraries`, each entry also carries a full itinerary so the
/// detail view has something to show.
pub fn demo_entries(now_ms: i64, with_itineraries: bool) -> Vec<JourneyEntry> {
  let demos = [
    (
      "Gare de Perpignan",
      "Aéroport Perpignan Rivesaltes",
      "45 min",
      vec![
        Segment::new("R4", "#FF6B35", "#FFFFFF"),
        Segment::new("A", "#0066CC", "#FFFFFF"),
      ],
      true,
      0,
      1,
    ),
    (
      "République",
      "Clinique Saint Pierre",
      "22 min",
      vec![Segment::new("B", "#E91E63", "#FFFFFF")],
      false,
      HOUR_MS,
      3,
    ),
    (
      "Castillet",
      "Université",
      "18 min",
      vec![Segment::new("C", "#4CAF50", "#FFFFFF")],
      true,
      2 * HOUR_MS,
      5,
    ),
  ];

  demos
    .into_iter()
    .map(
      |(from, to, duration, segments, has_walk, age_ms, access_count)| {
        let full_itinerary = with_itineraries.then(|| demo_itinerary(from, to, duration, &segments));
        JourneyEntry {
          key: normalize_key(from, to),
          from_name: from.to_string(),
          to_name: to.to_string(),
          departure_time: DEFAULT_DEPARTURE.to_string(),
          summary: Summary {
            trip_type: TripType::Bus,
            duration: duration.to_string(),
            segments,
            has_walk,
          },
          full_itinerary,
          search_time: None,
          saved_at: now_ms - age_ms,
          expires_at: now_ms + DEFAULT_TTL_MS,
          access_count,
        }
      },
    )
    .collect()
}

/// Overwrite the journey slot with the demo journeys. Returns how many were written.
pub fn write_demo_slot(
  storage: &dyn SlotStorage,
  now_ms: i64,
  with_itineraries: bool,
) -> Result<usize, StorageError> {
  let entries = demo_entries(now_ms, with_itineraries);
  let raw = payload::encode(&entries).map_err(|e| StorageError::Backend(e.to_string()))?;
  storage.write_slot(SLOT_KEY, &raw)?;
  Ok(entries.len())
}

fn demo_itinerary(from: &str, to: &str, duration: &str, segments: &[Segment]) -> Value {
  let steps: Vec<Value> = segments
    .iter()
    .map(|s| {
      json!({
        "type": "BUS",
        "routeShortName": s.name,
        "routeColor": s.color,
        "routeTextColor": s.text_color,
      })
    })
    .collect();

  json!({
    "type": "BUS",
    "departureStop": from,
    "arrivalStop": to,
    "duration": duration,
    "steps": steps,
    "summarySegments": segments,
  })
}

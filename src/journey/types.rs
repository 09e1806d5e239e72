//! Journey records as they are persisted in the storage slot.
//!
//! Field names follow the slot's JSON layout exactly (camelCase), so a
//! payload produced by any other tool with the same shape round-trips
//! through these types unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Departure qualifier used when the traveller did not pick a time.
pub const DEFAULT_DEPARTURE: &str = "Maintenant";

/// Badge color for a line whose color is missing or unusable.
pub const DEFAULT_LINE_COLOR: &str = "#607D8B";
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";

/// One cached trip lookup result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyEntry {
  /// Normalized origin/destination key
  pub key: String,
  pub from_name: String,
  pub to_name: String,
  /// "Maintenant" or a specific time label
  pub departure_time: String,
  pub summary: Summary,
  /// Full routing response, attached lazily when the trip detail is opened
  #[serde(default)]
  pub full_itinerary: Option<serde_json::Value>,
  /// When routing actually ran, distinct from the cache write time
  #[serde(default)]
  pub search_time: Option<String>,
  /// Write time, epoch milliseconds
  pub saved_at: i64,
  /// Absolute expiry, epoch milliseconds; invalid at and after this instant
  pub expires_at: i64,
  pub access_count: u32,
}

impl JourneyEntry {
  /// Whether the entry is expired at `now_ms`.
  pub fn is_expired_at(&self, now_ms: i64) -> bool {
    now_ms >= self.expires_at
  }

  /// "From → To" label used by list views.
  pub fn route_label(&self) -> String {
    format!("{} → {}", self.from_name, self.to_name)
  }
}

/// Compact, renderable trip summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
  #[serde(rename = "type")]
  pub trip_type: TripType,
  pub duration: String,
  pub segments: Vec<Segment>,
  pub has_walk: bool,
}

impl Summary {
  /// Same summary with every segment color in `#RGB`/`#RRGGBB` form.
  pub fn with_hex_colors(mut self) -> Self {
    for segment in &mut self.segments {
      segment.color = normalize_hex_color(&segment.color, DEFAULT_LINE_COLOR);
      segment.text_color = normalize_hex_color(&segment.text_color, DEFAULT_TEXT_COLOR);
    }
    self
  }
}

/// One leg of a trip, as shown in the summary badge row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
  /// Line label (e.g. "R4", "A")
  pub name: String,
  /// Hex color, e.g. "#FF6B35"
  pub color: String,
  pub text_color: String,
}

impl Segment {
  pub fn new(
    name: impl Into<String>,
    color: impl Into<String>,
    text_color: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      color: color.into(),
      text_color: text_color.into(),
    }
  }
}

/// Dominant mode of a trip, used for icon/badge selection.
///
/// Serialized as the uppercase mode name. Modes this crate does not know
/// about are kept verbatim so a payload written by a newer producer still
/// loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TripType {
  Bus,
  Walk,
  Mixed,
  Bike,
  Other(String),
}

impl From<String> for TripType {
  fn from(s: String) -> Self {
    match s.as_str() {
      "BUS" => Self::Bus,
      "WALK" => Self::Walk,
      "MIXED" => Self::Mixed,
      "BIKE" => Self::Bike,
      _ => Self::Other(s),
    }
  }
}

impl From<TripType> for String {
  fn from(t: TripType) -> Self {
    match t {
      TripType::Bus => "BUS".to_string(),
      TripType::Walk => "WALK".to_string(),
      TripType::Mixed => "MIXED".to_string(),
      TripType::Bike => "BIKE".to_string(),
      TripType::Other(s) => s,
    }
  }
}

impl std::str::FromStr for TripType {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::from(s.trim().to_uppercase()))
  }
}

impl fmt::Display for TripType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s: String = self.clone().into();
    f.write_str(&s)
  }
}

/// Check that a color is `#RGB` or `#RRGGBB`.
pub fn is_hex_color(s: &str) -> bool {
  match s.strip_prefix('#') {
    Some(digits) => {
      (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    }
    None => false,
  }
}

/// Coerce a color to `#RGB`/`#RRGGBB`.
///
/// Bare hex digits, as GTFS `route_color` carries them, get a `#` prefix.
/// Anything else is replaced by `fallback`.
pub fn normalize_hex_color(raw: &str, fallback: &str) -> String {
  let trimmed = raw.trim();
  if is_hex_color(trimmed) {
    return trimmed.to_string();
  }
  let prefixed = format!("#{}", trimmed);
  if is_hex_color(&prefixed) {
    prefixed
  } else {
    fallback.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_entry() -> JourneyEntry {
    JourneyEntry {
      key: "castillet|université".to_string(),
      from_name: "Castillet".to_string(),
      to_name: "Université".to_string(),
      departure_time: DEFAULT_DEPARTURE.to_string(),
      summary: Summary {
        trip_type: TripType::Bus,
        duration: "18 min".to_string(),
        segments: vec![Segment::new("C", "#4CAF50", "#FFFFFF")],
        has_walk: true,
      },
      full_itinerary: None,
      search_time: None,
      saved_at: 1_000,
      expires_at: 2_000,
      access_count: 5,
    }
  }

  #[test]
  fn test_serializes_with_slot_field_names() {
    let json = serde_json::to_value(sample_entry()).unwrap();

    assert_eq!(json["fromName"], "Castillet");
    assert_eq!(json["toName"], "Université");
    assert_eq!(json["departureTime"], "Maintenant");
    assert_eq!(json["summary"]["type"], "BUS");
    assert_eq!(json["summary"]["hasWalk"], true);
    assert_eq!(json["summary"]["segments"][0]["textColor"], "#FFFFFF");
    assert_eq!(json["savedAt"], 1_000);
    assert_eq!(json["expiresAt"], 2_000);
    assert_eq!(json["accessCount"], 5);
    // Absent optional fields are written as explicit nulls
    assert!(json["fullItinerary"].is_null());
    assert!(json.as_object().unwrap().contains_key("searchTime"));
  }

  #[test]
  fn test_unknown_trip_type_is_preserved() {
    let t: TripType = serde_json::from_str("\"TRAM\"").unwrap();
    assert_eq!(t, TripType::Other("TRAM".to_string()));
    assert_eq!(serde_json::to_string(&t).unwrap(), "\"TRAM\"");
  }

  #[test]
  fn test_trip_type_from_str_is_case_insensitive() {
    assert_eq!("walk".parse::<TripType>().unwrap(), TripType::Walk);
    assert_eq!(" Mixed ".parse::<TripType>().unwrap(), TripType::Mixed);
  }

  #[test]
  fn test_expiry_boundary_is_inclusive() {
    let entry = sample_entry();
    assert!(!entry.is_expired_at(1_999));
    assert!(entry.is_expired_at(2_000));
  }

  #[test]
  fn test_hex_color() {
    assert!(is_hex_color("#E91E63"));
    assert!(is_hex_color("#fff"));
    assert!(!is_hex_color("E91E63"));
    assert!(!is_hex_color("#E91E6"));
    assert!(!is_hex_color("#GGGGGG"));
    assert!(!is_hex_color("red"));
  }

  #[test]
  fn test_normalize_hex_color() {
    assert_eq!(normalize_hex_color("#E91E63", "#000"), "#E91E63");
    assert_eq!(normalize_hex_color("E91E63", "#000"), "#E91E63");
    assert_eq!(normalize_hex_color(" fff ", "#000"), "#fff");
    assert_eq!(normalize_hex_color("pink", "#000"), "#000");
    assert_eq!(normalize_hex_color("", "#000"), "#000");
    assert_eq!(normalize_hex_color("##E91E63", "#000"), "#000");
  }

  #[test]
  fn test_summary_colors_are_coerced_per_segment() {
    let summary = Summary {
      trip_type: TripType::Mixed,
      duration: "31 min".to_string(),
      segments: vec![
        Segment::new("A", "FF6B35", "000000"),
        Segment::new("Marche", "", "#FFFFFF"),
      ],
      has_walk: true,
    }
    .with_hex_colors();

    assert_eq!(summary.segments[0], Segment::new("A", "#FF6B35", "#000000"));
    assert_eq!(
      summary.segments[1],
      Segment::new("Marche", DEFAULT_LINE_COLOR, "#FFFFFF")
    );
  }
}

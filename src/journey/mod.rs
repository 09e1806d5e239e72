//! Journey data model shared by the cache, the planner and the UI.

mod types;

pub use types::{
  is_hex_color, normalize_hex_color, JourneyEntry, Segment, Summary, TripType, DEFAULT_DEPARTURE,
  DEFAULT_LINE_COLOR, DEFAULT_TEXT_COLOR,
};

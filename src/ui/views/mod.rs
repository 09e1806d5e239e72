pub mod journey_detail;
pub mod recent;

use perimap::journey::Segment;
use ratatui::prelude::*;

use super::hex_to_color;

/// Line badges in the segment's own colors, followed by a space each
pub fn segment_badges(segments: &[Segment]) -> Vec<Span<'static>> {
  let mut spans = Vec::with_capacity(segments.len() * 2);
  for segment in segments {
    let style = Style::default()
      .bg(hex_to_color(&segment.color).unwrap_or(Color::Gray))
      .fg(hex_to_color(&segment.text_color).unwrap_or(Color::White))
      .add_modifier(Modifier::BOLD);
    spans.push(Span::styled(format!(" {} ", segment.name), style));
    spans.push(Span::raw(" "));
  }
  spans
}

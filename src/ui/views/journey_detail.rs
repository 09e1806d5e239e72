use chrono::{DateTime, Local};
use perimap::journey::JourneyEntry;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::segment_badges;

/// Draw one cached journey with its summary and, when attached, the full itinerary
pub fn draw_journey_detail(frame: &mut Frame, area: Rect, entry: &JourneyEntry, now_ms: i64) {
  let block = Block::default()
    .title(format!(" {} ", entry.route_label()))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(6), // Summary fields
      Constraint::Length(1), // Separator
      Constraint::Min(1),    // Itinerary
    ])
    .split(inner);

  let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));

  let mut badges = vec![label("Lines:     ")];
  badges.extend(segment_badges(&entry.summary.segments));
  if entry.summary.has_walk {
    badges.push(Span::raw("+ walk"));
  }

  let header = vec![
    Line::from(vec![
      label("Departure: "),
      Span::raw(&entry.departure_time),
      Span::raw("   "),
      label("Type: "),
      Span::raw(entry.summary.trip_type.to_string()),
    ]),
    Line::from(vec![
      label("Duration:  "),
      Span::styled(&entry.summary.duration, Style::default().fg(Color::Yellow)),
    ]),
    Line::from(badges),
    Line::from(vec![
      label("Saved:     "),
      Span::raw(format_instant(entry.saved_at)),
      Span::raw("   "),
      label("Expires: "),
      Span::raw(format_instant(entry.expires_at)),
    ]),
    Line::from(vec![
      label("Searched:  "),
      Span::raw(entry.search_time.as_deref().unwrap_or("-")),
    ]),
    Line::from(vec![
      label("Used:      "),
      Span::raw(format!("{} time(s)", entry.access_count)),
      if entry.is_expired_at(now_ms) {
        Span::styled("   expired", Style::default().fg(Color::Red))
      } else {
        Span::raw("")
      },
    ]),
  ];
  frame.render_widget(Paragraph::new(header), chunks[0]);

  let separator = "─".repeat(chunks[1].width as usize);
  frame.render_widget(
    Paragraph::new(separator).style(Style::default().fg(Color::DarkGray)),
    chunks[1],
  );

  let itinerary = match &entry.full_itinerary {
    Some(value) => serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
    None => "Summary only. The full itinerary is fetched when the trip is opened in the planner."
      .to_string(),
  };
  let paragraph = Paragraph::new(itinerary).wrap(Wrap { trim: false });
  frame.render_widget(paragraph, chunks[2]);
}

fn format_instant(epoch_ms: i64) -> String {
  DateTime::from_timestamp_millis(epoch_ms)
    .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    .unwrap_or_else(|| "-".to_string())
}

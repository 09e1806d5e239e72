use chrono::{DateTime, Local};
use perimap::journey::JourneyEntry;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::segment_badges;

pub fn draw_recent_list(
  frame: &mut Frame,
  area: Rect,
  entries: &[&JourneyEntry],
  selected: usize,
  filter: &str,
  now_ms: i64,
) {
  let title = if filter.is_empty() {
    format!(" Vos trajets ({}) ", entries.len())
  } else {
    format!(" Vos trajets [/{}] ({}) ", filter, entries.len())
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if entries.is_empty() {
    let content = if filter.is_empty() {
      "Aucun trajet répertorié pour l'instant."
    } else {
      "No journey matches the filter."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = entries
    .iter()
    .map(|entry| {
      let mut spans = vec![
        Span::styled(
          format!("{:<12}", saved_label(entry.saved_at)),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
          format!("{:<8}", entry.summary.duration),
          Style::default().fg(Color::Yellow),
        ),
        Span::raw(" "),
      ];
      spans.extend(segment_badges(&entry.summary.segments));
      if entry.summary.has_walk {
        spans.push(Span::styled("🚶 ", Style::default().fg(Color::DarkGray)));
      }
      spans.push(Span::raw(truncate(&entry.route_label(), 60)));
      if remaining_days(entry.expires_at, now_ms) < 1 {
        spans.push(Span::styled(" (expiring)", Style::default().fg(Color::Red)));
      }
      ListItem::new(Line::from(spans))
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(selected));

  frame.render_stateful_widget(list, area, &mut state);
}

fn saved_label(saved_at: i64) -> String {
  DateTime::from_timestamp_millis(saved_at)
    .map(|t| t.with_timezone(&Local).format("%d/%m %H:%M").to_string())
    .unwrap_or_default()
}

fn remaining_days(expires_at: i64, now_ms: i64) -> i64 {
  (expires_at - now_ms) / perimap::cache::DAY_MS
}

fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_counts_characters() {
    assert_eq!(truncate("République", 20), "République");
    assert_eq!(truncate("Aéroport Perpignan", 5), "Aéro…");
  }

  #[test]
  fn test_remaining_days() {
    let day = perimap::cache::DAY_MS;
    assert_eq!(remaining_days(7 * day, 0), 7);
    assert_eq!(remaining_days(day - 1, 0), 0);
  }
}

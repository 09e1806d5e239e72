mod components;
mod views;

use crate::app::{App, Mode, ViewState};
use crate::commands;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  // Draw current view
  if let Some(view) = app.current_view() {
    match view {
      ViewState::RecentList { entries, selected } => {
        let visible = app.visible_entries(entries);
        views::recent::draw_recent_list(
          frame,
          chunks[0],
          &visible,
          *selected,
          app.search_filter(),
          app.now_ms(),
        );
      }
      ViewState::JourneyDetail { entry } => {
        views::journey_detail::draw_journey_detail(frame, chunks[0], entry, app.now_ms());
      }
    }
  }

  if *app.mode() == Mode::Command {
    let suggestions = commands::get_suggestions(app.command_input());
    components::command_overlay::draw_command_overlay(
      frame,
      chunks[0],
      app.command_input(),
      &suggestions,
      app.selected_suggestion(),
    );
  }

  // Draw status bar
  draw_status_bar(frame, chunks[1], app);
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = match app.mode() {
    Mode::Normal => match app.status() {
      Some(status) => (format!(" {}", status), Style::default().fg(Color::Green)),
      None => {
        let hint = concat!(
          " :command  /filter  j/k:nav  Enter:open  f:re-route",
          "  d:remove  x:clear expired  q:back"
        );
        (hint.to_string(), Style::default().fg(Color::DarkGray))
      }
    },
    Mode::Command => {
      let cmd = format!(":{}", app.command_input());
      (cmd, Style::default().fg(Color::Yellow))
    }
    Mode::Search => {
      let search = format!("/{}", app.search_filter());
      (search, Style::default().fg(Color::Cyan))
    }
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

/// Parse `#RGB` / `#RRGGBB` into a terminal color.
pub(crate) fn hex_to_color(hex: &str) -> Option<Color> {
  let digits = hex.strip_prefix('#')?;
  let expanded: String = match digits.len() {
    3 => digits.chars().flat_map(|c| [c, c]).collect(),
    6 => digits.to_string(),
    _ => return None,
  };
  let value = u32::from_str_radix(&expanded, 16).ok()?;
  Some(Color::Rgb(
    ((value >> 16) & 0xFF) as u8,
    ((value >> 8) & 0xFF) as u8,
    (value & 0xFF) as u8,
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hex_to_color() {
    assert_eq!(hex_to_color("#E91E63"), Some(Color::Rgb(0xE9, 0x1E, 0x63)));
    assert_eq!(hex_to_color("#fff"), Some(Color::Rgb(0xFF, 0xFF, 0xFF)));
    assert_eq!(hex_to_color("E91E63"), None);
    assert_eq!(hex_to_color("#12345"), None);
  }
}

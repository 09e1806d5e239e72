use crate::commands::Command;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 6;

/// Cache command palette, anchored top-left of `area`.
pub fn draw_command_overlay(
  frame: &mut Frame,
  area: Rect,
  input: &str,
  suggestions: &[&Command],
  selected_suggestion: usize,
) {
  // Input row plus either the matches or a one-line hint
  let body_rows = suggestions.len().clamp(1, MAX_SUGGESTIONS) as u16;
  let palette = Rect::new(
    area.x + 1,
    area.y + 1,
    (area.width * 3 / 5).clamp(34, 64),
    body_rows + 3,
  )
  .intersection(area);

  frame.render_widget(Clear, palette);

  let frame_block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow))
    .title(" Cache command ");
  let inner = frame_block.inner(palette);
  frame.render_widget(frame_block, palette);

  if inner.height == 0 {
    return;
  }

  let [prompt_row, body] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

  frame.render_widget(
    Paragraph::new(Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(input),
      Span::styled("▏", Style::default().fg(Color::Yellow)),
    ])),
    prompt_row,
  );

  if body.height == 0 {
    return;
  }

  if suggestions.is_empty() {
    frame.render_widget(
      Paragraph::new(Span::styled(
        "no matching command",
        Style::default().fg(Color::DarkGray).italic(),
      )),
      body,
    );
    return;
  }

  let rows: Vec<ListItem> = suggestions
    .iter()
    .take(MAX_SUGGESTIONS)
    .map(|cmd| suggestion_row(cmd))
    .collect();

  let mut state = ListState::default().with_selected(Some(selected_suggestion));
  frame.render_stateful_widget(
    List::new(rows).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White)),
    body,
    &mut state,
  );
}

fn suggestion_row(cmd: &Command) -> ListItem<'static> {
  let mut spans = vec![
    Span::styled(format!("{:<14}", cmd.name), Style::default().fg(Color::Cyan)),
    Span::raw(cmd.description),
  ];
  if !cmd.aliases.is_empty() {
    spans.push(Span::styled(
      format!("  ({})", cmd.aliases.join(", ")),
      Style::default().fg(Color::DarkGray),
    ));
  }
  ListItem::new(Line::from(spans))
}

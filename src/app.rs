use crate::commands;
use crate::event::{Event, EventHandler};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use perimap::cache::JourneyCache;
use perimap::journey::JourneyEntry;
use perimap::planner::{self, Router, SearchRequest, TripSource};
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  Search,
}

/// View state - each variant owns its data
#[derive(Debug)]
pub enum ViewState {
  /// Root view: most recent journeys first
  RecentList {
    entries: Vec<JourneyEntry>,
    selected: usize,
  },
  /// Pushed via Enter on a recent journey
  JourneyDetail { entry: Box<JourneyEntry> },
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always the recent list
  view_stack: Vec<ViewState>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Search filter input (after pressing /)
  search_filter: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// One-line feedback shown in the status bar
  status: Option<String>,

  /// Journey cache, owned by the panel for the whole session
  cache: JourneyCache,

  /// Routing service used when a selected journey is stale or refreshed
  router: Arc<dyn Router>,

  /// How many journeys the panel shows
  recent_limit: usize,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(cache: JourneyCache, recent_limit: usize, router: Arc<dyn Router>) -> Self {
    Self {
      view_stack: vec![ViewState::RecentList {
        entries: Vec::new(),
        selected: 0,
      }],
      mode: Mode::Normal,
      command_input: String::new(),
      search_filter: String::new(),
      selected_suggestion: 0,
      status: None,
      cache,
      router,
      recent_limit,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.refresh_recent();

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event).await,
        None => break,
      }
    }
    Ok(())
  }

  pub fn current_view(&self) -> Option<&ViewState> {
    self.view_stack.last()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn search_filter(&self) -> &str {
    &self.search_filter
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  pub fn now_ms(&self) -> i64 {
    self.cache.now_ms()
  }

  /// Journeys of the recent list that match the search filter.
  pub fn visible_entries<'a>(&self, entries: &'a [JourneyEntry]) -> Vec<&'a JourneyEntry> {
    filter_entries(entries, &self.search_filter)
  }

  async fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key).await,
      Event::Tick => self.refresh_recent(),
    }
  }

  async fn handle_key(&mut self, key: KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key).await,
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Search => self.handle_search_mode_key(key),
    }
  }

  async fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Enter => self.open_selected(false).await,
      KeyCode::Char('f') => self.open_selected(true).await,
      KeyCode::Esc => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.search_filter.clear();
        }
      }

      // Cache maintenance
      KeyCode::Char('d') => self.remove_selected(),
      KeyCode::Char('x') => self.clear_expired(),
      KeyCode::Char('r') => self.refresh_recent(),

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
      }
      KeyCode::Char('/') => {
        self.mode = Mode::Search;
        self.search_filter.clear();
      }

      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0; // Reset selection on input change
      }
      _ => {}
    }
  }

  fn handle_search_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.search_filter.clear();
      }
      KeyCode::Enter => {
        // Apply filter and return to normal mode
        self.mode = Mode::Normal;
      }
      KeyCode::Backspace => {
        self.search_filter.pop();
      }
      KeyCode::Char(c) => {
        self.search_filter.push(c);
      }
      _ => {}
    }
    self.reset_selection();
  }

  fn execute_command(&mut self) {
    // Either the highlighted suggestion or the raw input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = match suggestions.get(self.selected_suggestion) {
      Some(suggestion) => suggestion.name.to_string(),
      None => self.command_input.trim().to_lowercase(),
    };

    match cmd.as_str() {
      "recent" => {
        self.view_stack.truncate(1);
        self.search_filter.clear();
        self.refresh_recent();
      }
      "clear-expired" => self.clear_expired(),
      "reset" => {
        self.cache.reset();
        self.view_stack.truncate(1);
        self.refresh_recent();
        self.status = Some("All cached journeys forgotten".to_string());
      }
      "stats" => {
        let stats = self.cache.stats();
        self.status = Some(format!(
          "{}/{} journeys, {} hits, {} misses ({:.0}% hit rate){}",
          stats.entries,
          stats.max_entries,
          stats.hits,
          stats.misses,
          stats.hit_rate,
          if stats.persistent { "" } else { ", memory only" }
        ));
      }
      "quit" => {
        self.should_quit = true;
      }
      other => {
        self.status = Some(format!("Unknown command: {}", other));
      }
    }
    self.command_input.clear();
  }

  /// Re-read the recent list from the cache.
  fn refresh_recent(&mut self) {
    let latest = self.cache.list_recent(self.recent_limit);
    let visible = filter_entries(&latest, &self.search_filter).len();

    if let Some(ViewState::RecentList { entries, selected }) = self.view_stack.first_mut() {
      *entries = latest;
      *selected = (*selected).min(visible.saturating_sub(1));
    }
  }

  fn selected_entry(&self) -> Option<&JourneyEntry> {
    match self.view_stack.last() {
      Some(ViewState::RecentList { entries, selected }) => {
        self.visible_entries(entries).get(*selected).copied()
      }
      _ => None,
    }
  }

  /// Search the selected journey again: cached when live, routed when
  /// stale or when `refresh` is set.
  async fn open_selected(&mut self, refresh: bool) {
    let Some(request) = self.selected_entry().map(|e| {
      SearchRequest::new(e.from_name.clone(), e.to_name.clone())
        .departing(e.departure_time.clone())
    }) else {
      return;
    };

    let router = Arc::clone(&self.router);
    let outcome =
      planner::search(&mut self.cache, &request, refresh, || router.route(request.clone())).await;

    match outcome {
      Ok(outcome) => {
        self.status = match outcome.source {
          TripSource::Cache => None,
          TripSource::Routing => Some(format!("Re-routed {}", outcome.entry.route_label())),
        };
        self.view_stack.push(ViewState::JourneyDetail {
          entry: Box::new(outcome.entry),
        });
      }
      Err(e) => {
        warn!(error = %e, "Panel search failed");
        self.status = Some(format!(
          "{} → {} could not be refreshed: {}",
          request.from_name,
          request.to_name,
          e.root_cause()
        ));
      }
    }
    self.refresh_recent();
  }

  fn remove_selected(&mut self) {
    let Some((from, to)) = self
      .selected_entry()
      .map(|e| (e.from_name.clone(), e.to_name.clone()))
    else {
      return;
    };

    if self.cache.remove(&from, &to) {
      info!(from = %from, to = %to, "Journey removed from panel");
      self.status = Some(format!("Removed {} → {}", from, to));
    }
    self.refresh_recent();
  }

  fn clear_expired(&mut self) {
    let removed = self.cache.clear_expired();
    self.status = Some(format!("Cleared {} expired journey(s)", removed));
    self.refresh_recent();
  }

  fn reset_selection(&mut self) {
    if let Some(ViewState::RecentList { selected, .. }) = self.view_stack.first_mut() {
      *selected = 0;
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let filter = self.search_filter.clone();
    if let Some(ViewState::RecentList { entries, selected }) = self.view_stack.last_mut() {
      let len = filter_entries(entries, &filter).len();
      if len == 0 {
        return;
      }
      let next = (*selected as i64 + delta as i64).clamp(0, len as i64 - 1);
      *selected = next as usize;
    }
  }
}

/// Case-insensitive match of the filter against either endpoint.
fn filter_entries<'a>(entries: &'a [JourneyEntry], filter: &str) -> Vec<&'a JourneyEntry> {
  let needle = filter.trim().to_lowercase();
  entries
    .iter()
    .filter(|e| {
      needle.is_empty()
        || e.from_name.to_lowercase().contains(&needle)
        || e.to_name.to_lowercase().contains(&needle)
    })
    .collect()
}

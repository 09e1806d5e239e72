mod app;
mod commands;
mod event;
mod ui;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use perimap::cache::{
  seed, CacheStats, JourneyCache, MemoryStorage, NewJourney, NoopStorage, SlotStorage,
  SqliteStorage, SystemClock,
};
use perimap::config::{Config, StorageBackend};
use perimap::journey::{
  is_hex_color, JourneyEntry, Segment, Summary, TripType, DEFAULT_DEPARTURE, DEFAULT_TEXT_COLOR,
};
use perimap::logging;
use perimap::planner::OfflineRouter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "perimap")]
#[command(about = "Recent journeys and journey cache for the Périmap transit planner")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/perimap/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<CacheCommand>,
}

/// Operator commands; without one the recent-journeys panel opens
#[derive(Subcommand, Debug)]
enum CacheCommand {
  /// List recent journeys, most recent first
  Recent {
    /// How many journeys to show (default: recent.limit from config)
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Look up a journey (counts as a use)
  Get { from: String, to: String },
  /// Cache a journey summary
  Put {
    from: String,
    to: String,
    /// Departure qualifier
    #[arg(long, default_value = DEFAULT_DEPARTURE)]
    departure: String,
    /// Dominant mode (BUS, WALK, MIXED, ...)
    #[arg(long = "type", default_value = "BUS")]
    trip_type: TripType,
    /// Duration label, e.g. "22 min"
    #[arg(long)]
    duration: String,
    /// Line segment as NAME:#COLOR[:#TEXTCOLOR], repeatable
    #[arg(long = "segment", value_parser = parse_segment)]
    segments: Vec<Segment>,
    /// The trip includes walking
    #[arg(long)]
    walk: bool,
  },
  /// Attach a full itinerary (JSON file) to a cached journey
  Attach {
    from: String,
    to: String,
    file: PathBuf,
  },
  /// Remove one journey
  Remove { from: String, to: String },
  /// Remove every expired journey
  ClearExpired,
  /// Forget every journey and delete the storage slot
  Reset,
  /// Overwrite the slot with demo journeys
  Seed {
    /// Include full itineraries
    #[arg(long)]
    full: bool,
  },
  /// Show cache statistics
  Stats,
  /// Print the stored journeys as JSON, in stored order
  Export,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.log.dir.as_deref())?;

  let storage = open_storage(&config);

  match args.command {
    None => {
      let cache = open_cache(storage, &config);
      // Routing runs outside this tool; stale journeys can be shown but not re-routed
      let mut app = app::App::new(cache, config.recent.limit, Arc::new(OfflineRouter));
      app.run().await?;
    }
    Some(command) => {
      let mut cache = open_cache(storage.clone(), &config);
      run_command(&mut cache, storage.as_ref(), command, config.recent.limit)?;
    }
  }

  Ok(())
}

/// Pick the storage backend, degrading to memory-only when SQLite cannot be opened.
fn open_storage(config: &Config) -> Arc<dyn SlotStorage> {
  match config.cache.backend {
    StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    StorageBackend::Sqlite => {
      let opened = match &config.cache.db_path {
        Some(path) => SqliteStorage::open_at(path),
        None => SqliteStorage::open(),
      };
      match opened {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
          warn!(error = %e, "Journey storage unavailable, caching in memory only");
          Arc::new(NoopStorage)
        }
      }
    }
  }
}

fn open_cache(storage: Arc<dyn SlotStorage>, config: &Config) -> JourneyCache {
  JourneyCache::open(storage, Arc::new(SystemClock), config.cache.settings())
}

fn run_command(
  cache: &mut JourneyCache,
  storage: &dyn SlotStorage,
  command: CacheCommand,
  default_limit: usize,
) -> Result<()> {
  match command {
    CacheCommand::Recent { limit } => {
      let recent = cache.list_recent(limit.unwrap_or(default_limit));
      if recent.is_empty() {
        println!("Aucun trajet répertorié pour l'instant.");
      }
      for entry in &recent {
        println!("{}", describe(entry));
      }
    }
    CacheCommand::Get { from, to } => match cache.get(&from, &to) {
      Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
      None => return Err(eyre!("No cached journey for {} → {}", from, to)),
    },
    CacheCommand::Put {
      from,
      to,
      departure,
      trip_type,
      duration,
      segments,
      walk,
    } => {
      let summary = Summary {
        trip_type,
        duration,
        segments,
        has_walk: walk,
      };
      let entry = cache.put(NewJourney::new(from, to, departure, summary));
      println!("Cached {}", describe(&entry));
    }
    CacheCommand::Attach { from, to, file } => {
      let contents = std::fs::read_to_string(&file)
        .map_err(|e| eyre!("Failed to read itinerary {}: {}", file.display(), e))?;
      let itinerary: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| eyre!("Itinerary {} is not valid JSON: {}", file.display(), e))?;
      if !cache.attach_itinerary(&from, &to, itinerary) {
        return Err(eyre!("No cached journey for {} → {}", from, to));
      }
      println!("Itinerary attached to {} → {}", from, to);
    }
    CacheCommand::Remove { from, to } => {
      if cache.remove(&from, &to) {
        println!("Removed {} → {}", from, to);
      } else {
        println!("Nothing cached for {} → {}", from, to);
      }
    }
    CacheCommand::ClearExpired => {
      println!("Cleared {} expired journey(s)", cache.clear_expired());
    }
    CacheCommand::Reset => {
      cache.reset();
      println!("Journey cache reset");
    }
    CacheCommand::Stats => print_stats(&cache.stats()),
    CacheCommand::Export => {
      println!("{}", serde_json::to_string_pretty(cache.entries())?);
    }
    CacheCommand::Seed { full } => {
      // Written straight to the slot, the way an external seeding tool would
      let written = seed::write_demo_slot(storage, cache.now_ms(), full)?;
      println!("Seeded {} demo journeys", written);
    }
  }

  Ok(())
}

fn describe(entry: &JourneyEntry) -> String {
  let lines: Vec<&str> = entry
    .summary
    .segments
    .iter()
    .map(|s| s.name.as_str())
    .collect();
  format!(
    "{}  [{} {}{}]  {}  used {}x",
    entry.route_label(),
    entry.summary.trip_type,
    entry.summary.duration,
    if entry.summary.has_walk { " + walk" } else { "" },
    lines.join(" › "),
    entry.access_count
  )
}

fn print_stats(stats: &CacheStats) {
  println!("Journeys:    {}/{}", stats.entries, stats.max_entries);
  println!("Hits:        {}", stats.hits);
  println!("Misses:      {}", stats.misses);
  println!("Hit rate:    {:.1}%", stats.hit_rate);
  println!(
    "Persistence: {}",
    if stats.persistent { "on" } else { "memory only" }
  );
}

/// Parse `NAME:#COLOR[:#TEXTCOLOR]`.
fn parse_segment(s: &str) -> Result<Segment, String> {
  let mut parts = s.split(':');
  let name = parts
    .next()
    .filter(|n| !n.trim().is_empty())
    .ok_or_else(|| format!("missing line name in '{}'", s))?;
  let color = parts
    .next()
    .ok_or_else(|| format!("missing color in '{}'", s))?;
  let text_color = parts.next().unwrap_or(DEFAULT_TEXT_COLOR);

  if parts.next().is_some() {
    return Err(format!("too many ':' in '{}'", s));
  }
  for c in [color, text_color] {
    if !is_hex_color(c) {
      return Err(format!("'{}' is not a hex color like #E91E63", c));
    }
  }

  Ok(Segment::new(name.trim(), color, text_color))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_segment_with_default_text_color() {
    assert_eq!(
      parse_segment("B:#E91E63").unwrap(),
      Segment::new("B", "#E91E63", "#FFFFFF")
    );
  }

  #[test]
  fn test_parse_segment_full() {
    assert_eq!(
      parse_segment("R4:#FF6B35:#000000").unwrap(),
      Segment::new("R4", "#FF6B35", "#000000")
    );
  }

  #[test]
  fn test_parse_segment_rejects_bad_input() {
    assert!(parse_segment("B").is_err());
    assert!(parse_segment(":#E91E63").is_err());
    assert!(parse_segment("B:pink").is_err());
    assert!(parse_segment("B:#E91E63:#FFF:#000").is_err());
  }

  #[test]
  fn test_args_parse_put() {
    let args = Args::try_parse_from([
      "perimap",
      "put",
      "République",
      "Clinique Saint Pierre",
      "--duration",
      "22 min",
      "--segment",
      "B:#E91E63",
    ])
    .unwrap();

    match args.command {
      Some(CacheCommand::Put {
        departure,
        trip_type,
        segments,
        walk,
        ..
      }) => {
        assert_eq!(departure, "Maintenant");
        assert_eq!(trip_type, TripType::Bus);
        assert_eq!(segments.len(), 1);
        assert!(!walk);
      }
      other => panic!("expected put, got {:?}", other),
    }
  }

  #[test]
  fn test_no_subcommand_opens_panel() {
    let args = Args::try_parse_from(["perimap"]).unwrap();
    assert!(args.command.is_none());
  }
}

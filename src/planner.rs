//! Search flow: consult the journey cache, fall back to the routing service.

use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info};

use crate::cache::{JourneyCache, NewJourney};
use crate::journey::{JourneyEntry, Summary, DEFAULT_DEPARTURE};

/// What the traveller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
  pub from_name: String,
  pub to_name: String,
  /// "Maintenant" or a specific time label
  pub departure_time: String,
}

impl SearchRequest {
  pub fn new(from_name: impl Into<String>, to_name: impl Into<String>) -> Self {
    Self {
      from_name: from_name.into(),
      to_name: to_name.into(),
      departure_time: DEFAULT_DEPARTURE.to_string(),
    }
  }

  pub fn departing(mut self, departure_time: impl Into<String>) -> Self {
    self.departure_time = departure_time.into();
    self
  }
}

/// A successful answer from the routing service.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedTrip {
  pub summary: Summary,
  /// Full routing response, opaque to the cache
  pub itinerary: Value,
}

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripSource {
  /// Served from the journey cache without routing
  Cache,
  /// Freshly computed by the routing service and written to the cache
  Routing,
}

/// Result of a search, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
  pub entry: JourneyEntry,
  pub source: TripSource,
}

/// Access to the routing service for long-lived callers such as the panel.
pub trait Router: Send + Sync {
  fn route(&self, request: SearchRequest) -> BoxFuture<'_, Result<RoutedTrip>>;
}

/// Router for sessions without a routing service: every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRouter;

impl Router for OfflineRouter {
  fn route(&self, _request: SearchRequest) -> BoxFuture<'_, Result<RoutedTrip>> {
    futures::future::ready(Err(eyre!("no routing service configured"))).boxed()
  }
}

/// Run a search with cache-first strategy.
///
/// 1. Unless `refresh` is set, a live cache entry is returned as is
/// 2. Otherwise the routing service is called through `router`
/// 3. A routing failure is returned to the caller and nothing is cached
/// 4. A routing success is written to the cache, replacing any older entry
pub async fn search<F, Fut>(
  cache: &mut JourneyCache,
  request: &SearchRequest,
  refresh: bool,
  router: F,
) -> Result<SearchOutcome>
where
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<RoutedTrip>>,
{
  if !refresh {
    if let Some(entry) = cache.get(&request.from_name, &request.to_name) {
      return Ok(SearchOutcome {
        entry,
        source: TripSource::Cache,
      });
    }
  }

  debug!(
    from = %request.from_name,
    to = %request.to_name,
    refresh,
    "Routing journey"
  );
  let trip = router().await.wrap_err_with(|| {
    format!(
      "Routing failed for {} → {}",
      request.from_name, request.to_name
    )
  })?;

  let journey = NewJourney::new(
    request.from_name.clone(),
    request.to_name.clone(),
    request.departure_time.clone(),
    trip.summary,
  )
  .with_itinerary(trip.itinerary);
  let journey = match format_instant(cache.now_ms()) {
    Some(search_time) => journey.with_search_time(search_time),
    None => journey,
  };

  let entry = cache.put(journey);
  info!(key = %entry.key, "Journey routed and cached");

  Ok(SearchOutcome {
    entry,
    source: TripSource::Routing,
  })
}

fn format_instant(epoch_ms: i64) -> Option<String> {
  DateTime::<Utc>::from_timestamp_millis(epoch_ms).map(|t| t.to_rfc3339())
}

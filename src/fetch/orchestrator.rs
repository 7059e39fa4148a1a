//! The fetch orchestrator.
//!
//! One fetch runs the metrics call, publishes the reading, then runs the
//! projections call. Upstream failures never escape: each call resolves to
//! either live data or a tagged placeholder.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate, Utc};

use crate::data::normalize::{Co2Lookup, ProjectionShape, normalize_metrics, normalize_projections};
use crate::data::placeholder::{placeholder_projections, placeholder_reading};
use crate::data::upstream::{MetricsRequest, PredictionService, ProjectionsRequest};
use crate::domain::{
    Coordinate, EmissionLevel, MetricsReading, ProjectionSeries, ResolutionPolicy, SourceTag,
};
use crate::error::FetchError;
use crate::fetch::state::{FetchSnapshot, FetchState};

/// Result of one orchestrated fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub sequence: u64,
    pub location_key: Option<String>,
    pub reading: Arc<MetricsReading>,
    pub projections: Arc<ProjectionSeries>,
    /// False when a newer fetch had already claimed the shared state.
    pub applied: bool,
}

pub struct FetchOrchestrator {
    service: Arc<dyn PredictionService>,
    state: Mutex<FetchState>,
    last_stamp: AtomicI64,
}

impl FetchOrchestrator {
    pub fn new(service: Arc<dyn PredictionService>) -> Self {
        Self::with_policy(service, ResolutionPolicy::default())
    }

    pub fn with_policy(service: Arc<dyn PredictionService>, policy: ResolutionPolicy) -> Self {
        Self {
            service,
            state: Mutex::new(FetchState::new(policy)),
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Fetch data for the selected coordinate.
    ///
    /// Fails only when nothing is selected; every other outcome, including
    /// upstream failure, resolves to tagged data.
    pub async fn fetch_for_selection(
        &self,
        selected: Option<Coordinate>,
    ) -> Result<FetchOutcome, FetchError> {
        let coordinate = selected.ok_or(FetchError::NoSelection)?;
        Ok(self.fetch_location(Some(coordinate)).await)
    }

    /// Run one full fetch for `coordinate` and fold the result into the shared state.
    ///
    /// `None` short-circuits to placeholder data without any network call.
    pub async fn fetch_location(&self, coordinate: Option<Coordinate>) -> FetchOutcome {
        let sequence = self.lock_state().start_fetch();
        let mut in_flight = InFlight {
            state: &self.state,
            sequence,
            completed: false,
        };
        let location_key = coordinate.map(|c| c.location_key());
        tracing::debug!(sequence, location = location_key.as_deref().unwrap_or("-"), "fetch started");

        let reading = Arc::new(self.metrics_for(coordinate).await);
        if !self.lock_state().publish_reading(sequence, Arc::clone(&reading)) {
            tracing::debug!(sequence, "reading not published; a newer fetch already has");
        }

        let projections = Arc::new(self.projections_for(coordinate).await);
        let applied =
            self.lock_state()
                .complete_fetch(sequence, Arc::clone(&reading), Arc::clone(&projections));
        in_flight.completed = true;

        if !applied {
            tracing::info!(sequence, "fetch superseded by a newer request; result not retained");
        }

        FetchOutcome {
            sequence,
            location_key,
            reading,
            projections,
            applied,
        }
    }

    /// Resolve a CO2 reading for `coordinate`, applying the fallback policy.
    ///
    /// Does not touch the shared state; the proxy calls this directly.
    pub async fn metrics_for(&self, coordinate: Option<Coordinate>) -> MetricsReading {
        let date = today();
        let Some(coordinate) = coordinate else {
            tracing::info!("no coordinate supplied; serving placeholder reading");
            return placeholder_reading(None, date, SourceTag::DummyNoCoordinates, self.next_stamp(), None);
        };

        let request = MetricsRequest {
            coordinate,
            date,
            cache_bust: self.next_stamp(),
        };
        let result = self.service.fetch_metrics(&request).await;
        let fetched_at = self.next_stamp();

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(location = %coordinate.location_key(), "metrics call failed: {err}");
                return placeholder_reading(
                    Some(coordinate),
                    date,
                    SourceTag::DummyApiError,
                    fetched_at,
                    Some(err.to_string()),
                );
            }
        };

        let normalized = normalize_metrics(&body);
        let Co2Lookup::Found { alias, value } = normalized.co2 else {
            tracing::info!(location = %coordinate.location_key(), "upstream returned no CO2 field");
            return placeholder_reading(Some(coordinate), date, SourceTag::DummyNoCo2Data, fetched_at, None);
        };
        tracing::debug!(location = %coordinate.location_key(), alias, value, "live reading");

        let reading = MetricsReading {
            co2_ppm: value,
            coordinates: Some(coordinate),
            location_key: Some(coordinate.location_key()),
            date,
            source: SourceTag::Live,
            fetched_at,
            echoed_coordinates: normalized.echoed_coordinates,
            emission_level: Some(EmissionLevel::from_ppm(value)),
            air_quality: normalized.air_quality,
            confidence: normalized.confidence,
            model_version: normalized.model_version,
            error: None,
        };
        if reading.has_coordinate_mismatch() {
            tracing::warn!(
                requested = %coordinate,
                echoed = ?reading.echoed_coordinates,
                "upstream echoed a different coordinate"
            );
        }
        reading
    }

    /// Resolve a projection series for `coordinate`, applying the fallback policy.
    pub async fn projections_for(&self, coordinate: Option<Coordinate>) -> ProjectionSeries {
        let Some(coordinate) = coordinate else {
            return placeholder_projections(SourceTag::DummyNoCoordinates, self.next_stamp());
        };

        let request = ProjectionsRequest {
            coordinate,
            cache_bust: self.next_stamp(),
        };
        let result = self.service.fetch_projections(&request).await;
        let fetched_at = self.next_stamp();

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(location = %coordinate.location_key(), "projections call failed: {err}");
                return placeholder_projections(SourceTag::DummyApiError, fetched_at);
            }
        };

        match normalize_projections(&body) {
            ProjectionShape::Series { labels, values } => {
                match ProjectionSeries::new(labels, values, SourceTag::Live, fetched_at) {
                    Ok(series) => series,
                    Err(e) => {
                        tracing::info!("projection series rejected: {e}");
                        placeholder_projections(SourceTag::DummyNoCo2Data, fetched_at)
                    }
                }
            }
            ProjectionShape::Unrecognized(reason) => {
                tracing::info!(location = %coordinate.location_key(), "projection body unusable: {reason}");
                placeholder_projections(SourceTag::DummyNoCo2Data, fetched_at)
            }
        }
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        self.lock_state().snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.lock_state().is_ready()
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().is_loading()
    }

    /// Strictly increasing millisecond stamp, used both as the cache-busting
    /// request parameter and as `fetchedAt`.
    ///
    /// Wall-clock based, but bumped by one when two calls land in the same
    /// millisecond (or the clock steps back), so no two requests share a URL.
    fn next_stamp(&self) -> i64 {
        let now = wall_clock_millis();
        let prev = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(now.max(prev + 1)))
            .unwrap_or_else(|prev| prev);
        now.max(prev + 1)
    }

    fn lock_state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the loading unit of a fetch whose future is dropped mid-flight.
struct InFlight<'a> {
    state: &'a Mutex<FetchState>,
    sequence: u64,
    completed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .abandon_fetch(self.sequence);
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn wall_clock_millis() -> i64 {
    Utc::now().timestamp_millis()
}

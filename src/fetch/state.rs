//! Shared fetch state and its transitions.
//!
//! Every transition replaces whole slices (`Arc` swaps); nothing is mutated in
//! place, so a reader either sees the previous reading or the new one, never a
//! mix of the two.

use std::sync::Arc;

use crate::domain::{MetricsReading, ProjectionSeries, ResolutionPolicy};

#[derive(Debug, Clone, Default)]
pub struct FetchState {
    policy: ResolutionPolicy,
    issued: u64,
    in_flight: usize,
    ready: bool,
    reading: Option<Arc<MetricsReading>>,
    reading_sequence: u64,
    projections: Option<Arc<ProjectionSeries>>,
    projections_sequence: u64,
}

/// Point-in-time copy of the fetch state handed to renderers.
#[derive(Debug, Clone, Default)]
pub struct FetchSnapshot {
    /// At least one fetch is in flight.
    pub loading: bool,
    /// At least one fetch has completed; gates the dependent views.
    pub ready: bool,
    pub reading: Option<Arc<MetricsReading>>,
    pub projections: Option<Arc<ProjectionSeries>>,
    /// Sequence number of the fetch that produced `reading`.
    pub reading_sequence: u64,
    /// Sequence number of the fetch that produced `projections`.
    pub projections_sequence: u64,
    /// Number of fetches started so far.
    pub issued: u64,
}

impl FetchState {
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Register a new fetch; returns its sequence number (starting at 1).
    pub fn start_fetch(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.issued
    }

    /// Publish the reading of fetch `sequence` once its metrics call settled.
    ///
    /// Projections held from another fetch are dropped with it, so the
    /// snapshot never pairs this reading with someone else's series.
    /// Returns whether the reading was retained.
    pub fn publish_reading(&mut self, sequence: u64, reading: Arc<MetricsReading>) -> bool {
        if !self.wins(sequence, self.reading_sequence) {
            return false;
        }
        self.reading = Some(reading);
        self.reading_sequence = sequence;
        if self.projections_sequence != sequence {
            self.projections = None;
        }
        true
    }

    /// Finish fetch `sequence` with its reading and projections.
    ///
    /// Always clears one unit of loading and marks data ready, whether or not
    /// the result was retained. A retained result replaces reading and
    /// projections together. Returns whether it was retained.
    pub fn complete_fetch(
        &mut self,
        sequence: u64,
        reading: Arc<MetricsReading>,
        projections: Arc<ProjectionSeries>,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.ready = true;
        if !self.wins(sequence, self.reading_sequence) {
            return false;
        }
        self.reading = Some(reading);
        self.reading_sequence = sequence;
        self.projections = Some(projections);
        self.projections_sequence = sequence;
        true
    }

    /// A fetch that will never complete (its future was dropped).
    pub fn abandon_fetch(&mut self, sequence: u64) {
        tracing::debug!(sequence, "fetch abandoned before completion");
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        FetchSnapshot {
            loading: self.is_loading(),
            ready: self.ready,
            reading: self.reading.clone(),
            projections: self.projections.clone(),
            reading_sequence: self.reading_sequence,
            projections_sequence: self.projections_sequence,
            issued: self.issued,
        }
    }

    fn wins(&self, sequence: u64, current: u64) -> bool {
        match self.policy {
            ResolutionPolicy::LatestRequested => sequence >= current,
            ResolutionPolicy::LatestCompleted => true,
        }
    }
}

//! Hover/selection state for map interaction.
//!
//! Pointer-move events update the hover coordinate; pointer-click events
//! replace the selected coordinate. Only the selected coordinate is ever used
//! for a fetch. No I/O happens here; marker drawing is delegated to the map
//! collaborator through [`MarkerLayer`].

use crate::domain::{Coordinate, CoordinateError};

/// Opaque handle to a marker placed by the map collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

/// The map surface that owns marker rendering.
pub trait MarkerLayer {
    /// Place a selection marker at `at`.
    fn place(&mut self, at: Coordinate) -> MarkerId;

    /// Remove a marker previously returned by `place`.
    fn release(&mut self, marker: MarkerId);
}

#[derive(Debug, Clone, Default)]
pub struct CoordinateTracker {
    hover: Option<Coordinate>,
    selected: Option<Coordinate>,
    marker: Option<MarkerId>,
}

impl CoordinateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a hover position (e.g. the map's default centre).
    pub fn with_hover(hover: Coordinate) -> Self {
        Self {
            hover: Some(hover),
            ..Self::default()
        }
    }

    /// Record the pointer position.
    ///
    /// Positions outside geographic range (a pointer dragged past the map's
    /// edge) are ignored and the previous hover is kept.
    pub fn on_hover(&mut self, raw_lat: f64, raw_lng: f64) {
        match Coordinate::new(raw_lat, raw_lng) {
            Ok(c) => self.hover = Some(c),
            Err(e) => tracing::trace!("ignoring hover outside map range: {e}"),
        }
    }

    /// Replace the selection, moving the marker from the old point to the new one.
    pub fn on_select(
        &mut self,
        raw_lat: f64,
        raw_lng: f64,
        markers: &mut impl MarkerLayer,
    ) -> Result<Coordinate, CoordinateError> {
        let coordinate = Coordinate::new(raw_lat, raw_lng)?;
        if let Some(old) = self.marker.take() {
            markers.release(old);
        }
        self.marker = Some(markers.place(coordinate));
        self.selected = Some(coordinate);
        tracing::info!(location = %coordinate.location_key(), "location selected");
        Ok(coordinate)
    }

    pub fn hover(&self) -> Option<Coordinate> {
        self.hover
    }

    pub fn selected(&self) -> Option<Coordinate> {
        self.selected
    }

    pub fn marker(&self) -> Option<MarkerId> {
        self.marker
    }

    /// What the coordinate readout should show: the selection if any, else the hover.
    pub fn display(&self) -> Option<Coordinate> {
        self.selected.or(self.hover)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingLayer {
        next: u64,
        live: Vec<MarkerId>,
        released: Vec<MarkerId>,
    }

    impl MarkerLayer for RecordingLayer {
        fn place(&mut self, _at: Coordinate) -> MarkerId {
            self.next += 1;
            let id = MarkerId(self.next);
            self.live.push(id);
            id
        }

        fn release(&mut self, marker: MarkerId) {
            self.live.retain(|m| *m != marker);
            self.released.push(marker);
        }
    }

    #[test]
    fn hover_never_touches_selection() {
        let mut tracker = CoordinateTracker::new();
        tracker.on_hover(20.27001, 85.84004);
        assert_eq!(tracker.hover().unwrap().location_key(), "20.2700,85.8400");
        assert!(tracker.selected().is_none());
        assert!(tracker.marker().is_none());
    }

    #[test]
    fn out_of_range_hover_keeps_previous() {
        let mut tracker = CoordinateTracker::new();
        tracker.on_hover(10.0, 10.0);
        tracker.on_hover(95.0, 10.0);
        assert_eq!(tracker.hover().unwrap().lat(), 10.0);
    }

    #[test]
    fn select_releases_previous_marker() {
        let mut tracker = CoordinateTracker::new();
        let mut layer = RecordingLayer::default();

        tracker.on_select(28.7041, 77.1025, &mut layer).unwrap();
        let first = tracker.marker().unwrap();
        tracker.on_select(19.076, 72.8777, &mut layer).unwrap();

        assert_eq!(layer.released, vec![first]);
        assert_eq!(layer.live, vec![tracker.marker().unwrap()]);
        assert_eq!(tracker.selected().unwrap().location_key(), "19.0760,72.8777");
    }

    #[test]
    fn invalid_select_keeps_existing_selection() {
        let mut tracker = CoordinateTracker::new();
        let mut layer = RecordingLayer::default();
        tracker.on_select(13.0827, 80.2707, &mut layer).unwrap();

        let err = tracker.on_select(f64::NAN, 0.0, &mut layer).unwrap_err();
        assert_eq!(err, CoordinateError::NotFinite);
        assert_eq!(tracker.selected().unwrap().lat(), 13.0827);
        assert!(layer.released.is_empty());
    }

    #[test]
    fn display_prefers_selection() {
        let mut tracker = CoordinateTracker::with_hover(Coordinate::new(1.0, 1.0).unwrap());
        assert_eq!(tracker.display().unwrap().lat(), 1.0);
        tracker.on_select(2.0, 2.0, &mut RecordingLayer::default()).unwrap();
        tracker.on_hover(3.0, 3.0);
        assert_eq!(tracker.display().unwrap().lat(), 2.0);
    }
}

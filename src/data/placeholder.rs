//! Synthetic placeholder records used when live data is unavailable.
//!
//! Every record built here carries a `dummy_*` source tag so it can never be
//! mistaken for a live reading.

use chrono::NaiveDate;

use crate::domain::{
    AirQuality, Coordinate, MetricsReading, PLACEHOLDER_CO2_PPM, ProjectionSeries, SourceTag,
};

/// Month labels of the placeholder projection.
pub const PLACEHOLDER_LABELS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

/// Carbon density (tons/km²) of the placeholder projection.
pub const PLACEHOLDER_SERIES: [f64; 6] = [300.0, 310.0, 320.0, 330.0, 340.0, 350.0];

/// A placeholder reading for `coordinate` (absent for `dummy_no_coordinates`).
pub fn placeholder_reading(
    coordinate: Option<Coordinate>,
    date: NaiveDate,
    source: SourceTag,
    fetched_at: i64,
    error: Option<String>,
) -> MetricsReading {
    debug_assert!(source.is_placeholder(), "placeholder readings need a dummy_* tag");
    MetricsReading {
        co2_ppm: PLACEHOLDER_CO2_PPM,
        coordinates: coordinate,
        location_key: coordinate.map(|c| c.location_key()),
        date,
        source,
        fetched_at,
        echoed_coordinates: None,
        emission_level: None,
        air_quality: AirQuality::default(),
        confidence: None,
        model_version: None,
        error,
    }
}

/// The fixed six-month placeholder projection.
pub fn placeholder_projections(source: SourceTag, fetched_at: i64) -> ProjectionSeries {
    let labels = PLACEHOLDER_LABELS.iter().map(|l| l.to_string()).collect();
    let series = PLACEHOLDER_SERIES.to_vec();
    match ProjectionSeries::new(labels, series, source, fetched_at) {
        Ok(series) => series,
        // The constants above are non-empty and aligned.
        Err(e) => unreachable!("placeholder projection constants are invalid: {e}"),
    }
}

//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the orchestrator and both front-ends (dashboard and proxy)
//! - returned verbatim as JSON by the proxy endpoints
//! - written into debug bundles

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of decimal places kept for every captured coordinate.
pub const COORDINATE_DECIMALS: i32 = 4;

/// Placeholder CO2 value carried by every `dummy_*` reading.
pub const PLACEHOLDER_CO2_PPM: f64 = 100.0;

/// Inclusive CO2 band (ppm) considered healthy by the policy advisor.
pub const SAFE_CO2_BAND: (f64, f64) = (350.0, 400.0);

/// A point on the map, rounded to [`COORDINATE_DECIMALS`] places at capture.
///
/// The rounded pair is the coordinate identity: it is the fetch key and the
/// value shown to the user. Instances are never mutated; every interaction
/// produces a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number")]
    NotFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Capture a raw map position, rejecting anything outside geographic range.
    pub fn new(raw_lat: f64, raw_lng: f64) -> Result<Self, CoordinateError> {
        if !(raw_lat.is_finite() && raw_lng.is_finite()) {
            return Err(CoordinateError::NotFinite);
        }
        let lat = round_to_precision(raw_lat);
        let lng = round_to_precision(raw_lng);
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(raw_lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(raw_lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Stable string key for this location (`"lat,lng"` at fixed precision).
    pub fn location_key(&self) -> String {
        format!("{:.4},{:.4}", self.lat, self.lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

fn round_to_precision(v: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    let rounded = (v * scale).round() / scale;
    // Normalise -0.0 so keys never render as "-0.0000".
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Provenance of a reading or projection series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Taken from a successful upstream response.
    Live,
    /// No coordinate was supplied; no network call was made.
    DummyNoCoordinates,
    /// Upstream answered, but without a recognised numeric field.
    DummyNoCo2Data,
    /// Upstream failed (unreachable, non-2xx or unreadable body).
    DummyApiError,
}

impl SourceTag {
    pub fn is_placeholder(self) -> bool {
        !matches!(self, SourceTag::Live)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Live => "live",
            SourceTag::DummyNoCoordinates => "dummy_no_coordinates",
            SourceTag::DummyNoCo2Data => "dummy_no_co2_data",
            SourceTag::DummyApiError => "dummy_api_error",
        }
    }

    /// Short notice suitable for rendering next to placeholder data.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            SourceTag::Live => None,
            SourceTag::DummyNoCoordinates => Some("Placeholder data: no location selected."),
            SourceTag::DummyNoCo2Data => Some("Placeholder data: the prediction service returned no CO2 value."),
            SourceTag::DummyApiError => Some("Placeholder data: the prediction service is unavailable."),
        }
    }
}

/// Coarse classification of a live CO2 prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionLevel {
    Low,
    Medium,
    High,
}

impl EmissionLevel {
    /// `> 480` ppm is High, `> 440` is Medium, anything else Low.
    pub fn from_ppm(ppm: f64) -> Self {
        if ppm > 480.0 {
            EmissionLevel::High
        } else if ppm > 440.0 {
            EmissionLevel::Medium
        } else {
            EmissionLevel::Low
        }
    }
}

/// Optional pollutant panel passed through from the prediction service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// µg/m³
    pub pm2_5: Option<f64>,
    /// µg/m³
    pub pm10: Option<f64>,
    /// ppb
    pub nox: Option<f64>,
    /// ppm
    pub co: Option<f64>,
    /// ppb
    pub ozone: Option<f64>,
    /// ppb
    pub so2: Option<f64>,
}

impl AirQuality {
    pub fn is_empty(&self) -> bool {
        self.pm2_5.is_none()
            && self.pm10.is_none()
            && self.nox.is_none()
            && self.co.is_none()
            && self.ozone.is_none()
            && self.so2.is_none()
    }
}

/// Canonical CO2 reading for one location and date.
///
/// `co2_ppm` is the upstream value untouched when `source` is `Live`, and
/// exactly [`PLACEHOLDER_CO2_PPM`] otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReading {
    pub co2_ppm: f64,
    /// Coordinate the request was made for (`None` only for `dummy_no_coordinates`).
    pub coordinates: Option<Coordinate>,
    pub location_key: Option<String>,
    pub date: NaiveDate,
    pub source: SourceTag,
    /// Monotonic fetch stamp (unix millis, strictly increasing per orchestrator).
    #[serde(rename = "fetchedAt")]
    pub fetched_at: i64,
    /// Coordinate echoed back by upstream, kept apart from the request coordinate.
    pub echoed_coordinates: Option<Coordinate>,
    pub emission_level: Option<EmissionLevel>,
    #[serde(skip_serializing_if = "AirQuality::is_empty", default)]
    pub air_quality: AirQuality,
    pub confidence: Option<String>,
    pub model_version: Option<String>,
    /// Diagnostic message for `dummy_api_error` readings.
    pub error: Option<String>,
}

impl MetricsReading {
    /// True when upstream echoed a coordinate different from the one requested.
    pub fn has_coordinate_mismatch(&self) -> bool {
        match (self.coordinates, self.echoed_coordinates) {
            (Some(requested), Some(echoed)) => requested != echoed,
            _ => false,
        }
    }
}

/// A projection series; `labels` and `series` are aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProjectionSeries")]
pub struct ProjectionSeries {
    labels: Vec<String>,
    series: Vec<f64>,
    pub source: SourceTag,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: i64,
}

#[derive(Deserialize)]
struct RawProjectionSeries {
    labels: Vec<String>,
    series: Vec<f64>,
    source: SourceTag,
    #[serde(rename = "fetchedAt")]
    fetched_at: i64,
}

impl TryFrom<RawProjectionSeries> for ProjectionSeries {
    type Error = SeriesError;

    fn try_from(raw: RawProjectionSeries) -> Result<Self, Self::Error> {
        Self::new(raw.labels, raw.series, raw.source, raw.fetched_at)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("projection series is empty")]
    Empty,
    #[error("projection series has {labels} labels but {values} values")]
    LengthMismatch { labels: usize, values: usize },
    #[error("projection series contains a non-finite value")]
    NonFinite,
}

impl ProjectionSeries {
    pub fn new(
        labels: Vec<String>,
        series: Vec<f64>,
        source: SourceTag,
        fetched_at: i64,
    ) -> Result<Self, SeriesError> {
        if labels.is_empty() || series.is_empty() {
            return Err(SeriesError::Empty);
        }
        if labels.len() != series.len() {
            return Err(SeriesError::LengthMismatch {
                labels: labels.len(),
                values: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(SeriesError::NonFinite);
        }
        Ok(Self {
            labels,
            series,
            source,
            fetched_at,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn series(&self) -> &[f64] {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Last projected value (the horizon figure shown in summaries).
    pub fn horizon(&self) -> Option<(&str, f64)> {
        let label = self.labels.last()?;
        let value = self.series.last()?;
        Some((label.as_str(), *value))
    }

    /// Iterate `(label, value)` pairs in order.
    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels.iter().map(String::as_str).zip(self.series.iter().copied())
    }
}

/// Ordered, non-empty recommendation sentences.
pub type PolicyList = Vec<String>;

/// Which of several overlapping fetches may overwrite the dashboard state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// The most recently *started* fetch wins, regardless of arrival order.
    #[default]
    LatestRequested,
    /// Whichever fetch *finishes* last wins.
    LatestCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_rounds_to_four_places() {
        let c = Coordinate::new(20.270_049, 85.839_951).unwrap();
        assert_eq!(c.lat(), 20.27);
        assert_eq!(c.lng(), 85.84);
        assert_eq!(c.location_key(), "20.2700,85.8400");
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(Coordinate::new(f64::NAN, 0.0), Err(CoordinateError::NotFinite));
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn negative_zero_is_normalised() {
        let c = Coordinate::new(-0.000_01, 0.0).unwrap();
        assert_eq!(c.location_key(), "0.0000,0.0000");
    }

    #[test]
    fn source_tags_serialize_snake_case() {
        let json = serde_json::to_string(&SourceTag::DummyNoCo2Data).unwrap();
        assert_eq!(json, "\"dummy_no_co2_data\"");
        assert_eq!(SourceTag::DummyApiError.as_str(), "dummy_api_error");
        assert!(SourceTag::Live.notice().is_none());
        assert!(SourceTag::DummyNoCoordinates.is_placeholder());
    }

    #[test]
    fn emission_level_thresholds() {
        assert_eq!(EmissionLevel::from_ppm(440.0), EmissionLevel::Low);
        assert_eq!(EmissionLevel::from_ppm(440.5), EmissionLevel::Medium);
        assert_eq!(EmissionLevel::from_ppm(480.0), EmissionLevel::Medium);
        assert_eq!(EmissionLevel::from_ppm(481.0), EmissionLevel::High);
    }

    #[test]
    fn projection_series_rejects_invalid_shapes() {
        let labels = vec!["Jan".to_string(), "Feb".to_string()];
        assert_eq!(
            ProjectionSeries::new(labels.clone(), vec![1.0], SourceTag::Live, 0),
            Err(SeriesError::LengthMismatch { labels: 2, values: 1 })
        );
        assert_eq!(
            ProjectionSeries::new(Vec::new(), Vec::new(), SourceTag::Live, 0),
            Err(SeriesError::Empty)
        );
        let ok = ProjectionSeries::new(labels, vec![1.0, 2.0], SourceTag::Live, 0).unwrap();
        assert_eq!(ok.horizon(), Some(("Feb", 2.0)));
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": 20.270049, "lng": 85.84}"#).unwrap();
        assert_eq!(c.location_key(), "20.2700,85.8400");
        assert!(serde_json::from_str::<Coordinate>(r#"{"lat": 95.0, "lng": 0.0}"#).is_err());

        let ok: ProjectionSeries = serde_json::from_str(
            r#"{"labels": ["Jan"], "series": [300.0], "source": "live", "fetchedAt": 1}"#,
        )
        .unwrap();
        assert_eq!(ok.len(), 1);
        let misaligned = serde_json::from_str::<ProjectionSeries>(
            r#"{"labels": ["Jan", "Feb"], "series": [300.0], "source": "live", "fetchedAt": 1}"#,
        );
        assert!(misaligned.is_err());
        let empty = serde_json::from_str::<ProjectionSeries>(
            r#"{"labels": [], "series": [], "source": "live", "fetchedAt": 1}"#,
        );
        assert!(empty.is_err());
    }
}

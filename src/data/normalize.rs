//! Response normalization.
//!
//! The prediction backend has gone through several response layouts. This
//! module maps them onto one canonical view without guessing: every field is
//! looked up under a closed, ordered alias list, and a miss is reported as an
//! explicit variant rather than a default value.

use serde_json::{Map, Value};

use crate::domain::{AirQuality, Coordinate};

/// Accepted names for the CO2 quantity, in priority order.
pub const CO2_ALIASES: [&str; 6] = [
    "predicted_co2_ppm",
    "co2_ppm",
    "co2_emissions",
    "co2_level",
    "co2",
    "emissions",
];

const LAT_ALIASES: [&str; 2] = ["latitude", "lat"];
const LNG_ALIASES: [&str; 2] = ["longitude", "lng"];

/// Result of resolving the CO2 field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Co2Lookup {
    Found { alias: &'static str, value: f64 },
    Missing,
}

/// Canonical view of one prediction response.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetrics {
    pub co2: Co2Lookup,
    pub echoed_coordinates: Option<Coordinate>,
    pub air_quality: AirQuality,
    pub confidence: Option<String>,
    pub model_version: Option<String>,
}

/// Normalize a raw prediction body.
pub fn normalize_metrics(body: &Value) -> NormalizedMetrics {
    let Some(obj) = body.as_object() else {
        return NormalizedMetrics {
            co2: Co2Lookup::Missing,
            echoed_coordinates: None,
            air_quality: AirQuality::default(),
            confidence: None,
            model_version: None,
        };
    };

    NormalizedMetrics {
        co2: lookup_co2(obj),
        echoed_coordinates: echoed_coordinates(obj),
        air_quality: AirQuality {
            pm2_5: number_field(obj, &["pm2_5", "pm25"]),
            pm10: number_field(obj, &["pm10"]),
            nox: number_field(obj, &["nox"]),
            co: number_field(obj, &["co"]),
            ozone: number_field(obj, &["ozone", "o3"]),
            so2: number_field(obj, &["so2"]),
        },
        confidence: string_field(obj, "confidence"),
        model_version: string_field(obj, "model_version"),
    }
}

/// First finite numeric value under [`CO2_ALIASES`].
///
/// `null`, strings and non-finite numbers are skipped, so a later alias can
/// still match.
pub fn lookup_co2(obj: &Map<String, Value>) -> Co2Lookup {
    for alias in CO2_ALIASES {
        if let Some(value) = obj.get(alias).and_then(finite_number) {
            return Co2Lookup::Found { alias, value };
        }
    }
    Co2Lookup::Missing
}

fn echoed_coordinates(obj: &Map<String, Value>) -> Option<Coordinate> {
    let lat = number_field(obj, &LAT_ALIASES)?;
    let lng = number_field(obj, &LNG_ALIASES)?;
    Coordinate::new(lat, lng).ok()
}

/// Shape of a projection body after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionShape {
    /// Labels and values, equal length and non-empty.
    Series { labels: Vec<String>, values: Vec<f64> },
    Unrecognized(&'static str),
}

/// Normalize a raw projection body.
///
/// Accepted layouts:
///
/// - `{ "labels": [...], "series": [...] }`
/// - `{ "labels": [...], "data": [...] }`
/// - `{ "labels": [...], "datasets": [{ "data": [...] }, ...] }` (first dataset)
pub fn normalize_projections(body: &Value) -> ProjectionShape {
    let Some(obj) = body.as_object() else {
        return ProjectionShape::Unrecognized("body is not an object");
    };

    let Some(labels) = obj.get("labels").and_then(Value::as_array) else {
        return ProjectionShape::Unrecognized("missing `labels` array");
    };
    let labels: Option<Vec<String>> = labels
        .iter()
        .map(|l| l.as_str().map(str::to_string))
        .collect();
    let Some(labels) = labels else {
        return ProjectionShape::Unrecognized("`labels` must contain only strings");
    };

    let values = obj
        .get("series")
        .or_else(|| obj.get("data"))
        .or_else(|| {
            obj.get("datasets")
                .and_then(Value::as_array)
                .and_then(|sets| sets.first())
                .and_then(|set| set.get("data"))
        })
        .and_then(Value::as_array);
    let Some(values) = values else {
        return ProjectionShape::Unrecognized("missing `series`, `data` or `datasets[0].data`");
    };
    let values: Option<Vec<f64>> = values.iter().map(finite_number).collect();
    let Some(values) = values else {
        return ProjectionShape::Unrecognized("series must contain only finite numbers");
    };

    if labels.is_empty() || values.is_empty() {
        return ProjectionShape::Unrecognized("series is empty");
    }
    if labels.len() != values.len() {
        return ProjectionShape::Unrecognized("labels and series differ in length");
    }
    ProjectionShape::Series { labels, values }
}

fn finite_number(v: &Value) -> Option<f64> {
    let n = v.as_f64()?;
    if n.is_finite() { Some(n) } else { None }
}

fn number_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<f64> {
    aliases.iter().find_map(|alias| obj.get(*alias).and_then(finite_number))
}

fn string_field(obj: &Map<String, Value>, name: &str) -> Option<String> {
    obj.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

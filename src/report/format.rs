//! Formatted terminal output.
//!
//! Formatting lives in one place so the fetch and policy code stays free of
//! presentation, and output changes are localized.

use crate::domain::{AirQuality, MetricsReading, ProjectionSeries};

/// Width of the longest bar in [`format_projections`].
const BAR_WIDTH: usize = 40;

/// Format a reading with its provenance.
pub fn format_reading(reading: &MetricsReading) -> String {
    let mut out = String::new();

    out.push_str("=== Carbon Compass - CO2 reading ===\n");
    match reading.coordinates {
        Some(c) => out.push_str(&format!("Location: {c}\n")),
        None => out.push_str("Location: (none)\n"),
    }
    out.push_str(&format!("Date: {}\n", reading.date));
    out.push_str(&format!("CO2: {:.2} ppm\n", reading.co2_ppm));
    if let Some(level) = reading.emission_level {
        out.push_str(&format!("Emission level: {level:?}\n"));
    }
    out.push_str(&format!("Source: {}\n", reading.source.as_str()));
    if let Some(notice) = reading.source.notice() {
        out.push_str(&format!("! {notice}\n"));
    }
    if let Some(err) = &reading.error {
        out.push_str(&format!("Error: {err}\n"));
    }
    if reading.has_coordinate_mismatch() {
        if let Some(echoed) = reading.echoed_coordinates {
            out.push_str(&format!("Upstream echoed: {echoed}\n"));
        }
    }
    if let Some(confidence) = &reading.confidence {
        out.push_str(&format!("Confidence: {confidence}\n"));
    }
    if let Some(version) = &reading.model_version {
        out.push_str(&format!("Model: {version}\n"));
    }

    if !reading.air_quality.is_empty() {
        out.push_str("\nAir quality:\n");
        out.push_str(&format_air_quality(&reading.air_quality));
    }

    out
}

fn format_air_quality(aq: &AirQuality) -> String {
    let rows = [
        ("PM2.5", aq.pm2_5, "ug/m3"),
        ("PM10", aq.pm10, "ug/m3"),
        ("NOx", aq.nox, "ppb"),
        ("CO", aq.co, "ppm"),
        ("Ozone", aq.ozone, "ppb"),
        ("SO2", aq.so2, "ppb"),
    ];
    let mut out = String::new();
    for (name, value, unit) in rows {
        if let Some(v) = value {
            out.push_str(&format!("  {name:<6} {v:>8.2} {unit}\n"));
        }
    }
    out
}

/// Format a projection series as a label/value table with proportional bars.
pub fn format_projections(projections: &ProjectionSeries) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Projections (carbon density, tons/km2) [{}]\n",
        projections.source.as_str()
    ));

    let max = projections
        .series()
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    for (label, value) in projections.points() {
        let bar = if max > 0.0 && value > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push_str(
            format!("{:<8} {:>10.2} {}\n", truncate(label, 8), value, "#".repeat(bar)).trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Numbered policy list.
pub fn format_policies(policies: &[String]) -> String {
    let mut out = String::from("Policy recommendations:\n");
    for (i, p) in policies.iter().enumerate() {
        out.push_str(&format!("{:>2}. {p}\n", i + 1));
    }
    out
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

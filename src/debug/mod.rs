//! Debug bundle writer for inspecting a dashboard session.
//!
//! Captures what the user was looking at: the selection, the retained reading
//! with its provenance, the projection series and any policy outcome.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{Coordinate, MetricsReading, ProjectionSeries};
use crate::error::AppError;
use crate::fetch::FetchSnapshot;

/// Everything the bundle records.
#[derive(Debug, Clone, Copy)]
pub struct SessionDump<'a> {
    pub hover: Option<Coordinate>,
    pub selected: Option<Coordinate>,
    pub snapshot: &'a FetchSnapshot,
    pub policies: Option<&'a [String]>,
    pub policy_error: Option<&'a str>,
}

pub fn write_debug_bundle(dir: &Path, session: &SessionDump<'_>) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S%.3f");
    let location = session
        .selected
        .map(|c| c.location_key().replace(',', "_"))
        .unwrap_or_else(|| "none".to_string());
    let path = dir.join(format!("compass_debug_{location}_{ts}.md"));

    let mut file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    let io = |e: std::io::Error| AppError::new(4, format!("Failed to write debug: {e}"));

    writeln!(file, "# carbon compass debug bundle").map_err(io)?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339()).map_err(io)?;
    writeln!(file, "- hover: {}", fmt_coord(session.hover)).map_err(io)?;
    writeln!(file, "- selected: {}", fmt_coord(session.selected)).map_err(io)?;
    writeln!(
        file,
        "- fetches: issued={}, loading={}, ready={}, retained_sequence={}",
        session.snapshot.issued,
        session.snapshot.loading,
        session.snapshot.ready,
        session.snapshot.reading_sequence
    )
    .map_err(io)?;

    writeln!(file, "\n## Reading").map_err(io)?;
    match &session.snapshot.reading {
        Some(reading) => write_reading(&mut file, reading)?,
        None => writeln!(file, "(none)").map_err(io)?,
    }

    writeln!(file, "\n## Projections").map_err(io)?;
    match &session.snapshot.projections {
        Some(projections) => write_projections(&mut file, projections)?,
        None => writeln!(file, "(none)").map_err(io)?,
    }

    writeln!(file, "\n## Policies").map_err(io)?;
    if let Some(err) = session.policy_error {
        writeln!(file, "- error: {err}").map_err(io)?;
    }
    match session.policies {
        Some(policies) => {
            for (i, p) in policies.iter().enumerate() {
                writeln!(file, "{}. {p}", i + 1).map_err(io)?;
            }
        }
        None => writeln!(file, "(not requested)").map_err(io)?,
    }

    Ok(path)
}

fn write_reading(file: &mut File, reading: &MetricsReading) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(reading)
        .map_err(|e| AppError::new(4, format!("Failed to serialize reading: {e}")))?;
    let io = |e: std::io::Error| AppError::new(4, format!("Failed to write debug: {e}"));
    writeln!(file, "- source: {}", reading.source.as_str()).map_err(io)?;
    writeln!(file, "- co2_ppm: {:.3}", reading.co2_ppm).map_err(io)?;
    writeln!(file, "\n```json\n{json}\n```").map_err(io)
}

fn write_projections(file: &mut File, projections: &ProjectionSeries) -> Result<(), AppError> {
    let io = |e: std::io::Error| AppError::new(4, format!("Failed to write debug: {e}"));
    writeln!(
        file,
        "- source: {}, fetchedAt: {}",
        projections.source.as_str(),
        projections.fetched_at
    )
    .map_err(io)?;
    writeln!(file, "| label | value |").map_err(io)?;
    writeln!(file, "| - | - |").map_err(io)?;
    for (label, value) in projections.points() {
        writeln!(file, "| {label} | {value:.3} |").map_err(io)?;
    }
    Ok(())
}

fn fmt_coord(c: Option<Coordinate>) -> String {
    match c {
        Some(c) => c.location_key(),
        None => "-".to_string(),
    }
}

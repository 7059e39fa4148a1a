//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - captured map positions (`Coordinate`)
//! - canonical records (`MetricsReading`, `ProjectionSeries`, `PolicyList`)
//! - provenance tags (`SourceTag`) and fetch resolution (`ResolutionPolicy`)

pub mod types;

pub use types::*;

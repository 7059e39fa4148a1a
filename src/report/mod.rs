//! Reporting utilities: formatted terminal output for readings, projections
//! and policy lists.

pub mod format;

pub use format::{format_policies, format_projections, format_reading};

//! `carbon-compass` library crate.
//!
//! The binary (`compass`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the dashboard, the HTTP proxy and the one-shot commands share one
//!   fetch pipeline

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod policy;
pub mod report;
pub mod server;
pub mod tracker;
pub mod tui;

//! Fetch orchestration: sequencing, fallback policy and the shared
//! loading/ready state.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{FetchOrchestrator, FetchOutcome};
pub use state::{FetchSnapshot, FetchState};

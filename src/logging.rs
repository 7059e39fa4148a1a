//! Tracing subscriber setup.
//!
//! The proxy logs to stderr. The dashboard owns the terminal, so it logs to a
//! file under `debug/` instead.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

const DEFAULT_FILTER: &str = "carbon_compass=info,tower_http=debug,warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Log to stderr.
pub fn init_stderr() {
    // `try_init` so tests or embedders that already installed a subscriber are left alone.
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Log to `<dir>/compass.log`, returning the path written to.
pub fn init_file(dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create log dir: {e}")))?;
    let path = dir.join("compass.log");
    let file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create log file '{}': {e}", path.display())))?;

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init();
    Ok(path)
}

//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads configuration and sets up logging
//! - wires the services and dispatches to a front-end

use std::path::Path;

use clap::Parser;

use crate::cli::{Command, FetchArgs, PoliciesArgs, ServeArgs, TuiArgs};
use crate::config::Config;
use crate::domain::{Coordinate, ResolutionPolicy};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `compass` binary.
pub fn run() -> Result<(), AppError> {
    // `compass` and `compass --resolution ...` behave like `compass tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Serve(args) => handle_serve(args),
        Command::Fetch(args) => handle_fetch(args),
        Command::Policies(args) => handle_policies(args),
    }
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let log_path = crate::logging::init_file(Path::new("debug"))?;
    let config = Config::from_env()?;
    tracing::info!(log = %log_path.display(), "dashboard starting");

    let runtime = pipeline::build_runtime()?;
    let orchestrator = pipeline::build_orchestrator(&config, args.resolution)?;
    let (advisor, advisor_unavailable) = match pipeline::build_advisor(&config) {
        Ok(advisor) => (Some(advisor), None),
        Err(err) => {
            tracing::warn!("policy recommendations disabled: {err}");
            (None, Some(err.to_string()))
        }
    };

    crate::tui::run(crate::tui::Dashboard {
        orchestrator,
        advisor,
        advisor_unavailable,
        runtime: runtime.handle().clone(),
    })
}

fn handle_serve(args: ServeArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();
    let config = Config::from_env()?;
    let port = args.port.unwrap_or(config.port);

    let state = crate::server::AppState {
        orchestrator: pipeline::build_orchestrator(&config, ResolutionPolicy::default())?,
        advisor: pipeline::build_advisor(&config)?,
    };
    pipeline::build_runtime()?.block_on(crate::server::serve(state, port))
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();
    let config = Config::from_env()?;
    let coordinate = Coordinate::new(args.lat, args.lng)
        .map_err(|e| AppError::new(2, format!("Invalid coordinate: {e}")))?;

    let orchestrator = pipeline::build_orchestrator(&config, ResolutionPolicy::default())?;
    let outcome = pipeline::build_runtime()?.block_on(orchestrator.fetch_for_selection(Some(coordinate)))?;

    if args.json {
        let body = serde_json::json!({
            "metrics": &*outcome.reading,
            "projections": &*outcome.projections,
        });
        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| AppError::new(4, format!("Failed to serialize output: {e}")))?;
        println!("{text}");
    } else {
        println!("{}", crate::report::format_reading(&outcome.reading));
        println!("{}", crate::report::format_projections(&outcome.projections));
    }
    Ok(())
}

fn handle_policies(args: PoliciesArgs) -> Result<(), AppError> {
    crate::logging::init_stderr();
    let config = Config::from_env()?;
    let advisor = pipeline::build_advisor(&config)?;

    let policies = pipeline::build_runtime()?.block_on(advisor.recommend(args.co2))?;
    println!("{}", crate::report::format_policies(&policies));
    Ok(())
}

/// Rewrite argv so `compass` defaults to `compass tui`.
///
/// Rules:
/// - `compass`                         -> `compass tui`
/// - `compass --resolution X ...`      -> `compass tui --resolution X ...`
/// - `compass --help/--version/-h`     -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "serve" | "fetch" | "policies");
    if is_subcommand {
        return argv;
    }

    // A leading flag is a dashboard flag.
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

//! Command-line parsing for Carbon Compass.
//!
//! Argument parsing and command dispatch stay separate from the fetch and
//! policy code.

use clap::{Args, Parser, Subcommand};

use crate::domain::ResolutionPolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "compass", version, about = "Carbon Compass: CO2 predictions and policy advice by location")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive map dashboard (the default).
    Tui(TuiArgs),
    /// Run the local HTTP proxy (`/api/metrics`, `/api/projections`, `/api/policies`).
    Serve(ServeArgs),
    /// Fetch the reading and projections for one coordinate and print them.
    Fetch(FetchArgs),
    /// Generate policy recommendations for a CO2 level.
    Policies(PoliciesArgs),
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Which result to keep when fetches overlap.
    #[arg(long, value_enum, default_value_t = ResolutionPolicy::LatestRequested)]
    pub resolution: ResolutionPolicy,
}

#[derive(Debug, Args, Clone)]
pub struct ServeArgs {
    /// Listen port; overrides `PORT`.
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Latitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Print the reading and projections as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PoliciesArgs {
    /// CO2 level in ppm; omit for general recommendations.
    #[arg(long, value_name = "PPM")]
    pub co2: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_accepts_negative_coordinates() {
        let cli = Cli::parse_from(["compass", "fetch", "--lat", "-33.8688", "--lng", "151.2093"]);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.lat, -33.8688);
        assert!(!args.json);
    }

    #[test]
    fn tui_resolution_defaults_to_latest_requested() {
        let cli = Cli::parse_from(["compass", "tui"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(args.resolution, ResolutionPolicy::LatestRequested);

        let cli = Cli::parse_from(["compass", "tui", "--resolution", "latest-completed"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(args.resolution, ResolutionPolicy::LatestCompleted);
    }
}

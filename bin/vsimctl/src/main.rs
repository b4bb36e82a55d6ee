//! ---
//! vsim_section: "05-networking-external-interfaces"
//! vsim_subsection: "binary"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Control CLI for building the venue and emitting telemetry."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use vsim_common::{init_tracing, AppConfig, ConfigError};

mod assets;
mod emit;

const DEFAULT_CONFIG_PATH: &str = "configs/vsim.toml";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Venue simulation control utility",
    long_about = None
)]
struct Cli {
    #[arg(long, global = true, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Build the venue asset graph and export or persist it")]
    BuildAssets(assets::BuildArgs),
    #[command(about = "Generate the staff and manager roster stationed in the venue")]
    BuildStaff(assets::StaffArgs),
    #[command(about = "Handle one trigger: fetch assets and run the emission scheduler")]
    Emit,
    #[command(about = "Emit on every trigger interval until interrupted")]
    Serve,
    #[command(about = "Classify one map coordinate with the venue zoning")]
    Classify(assets::ClassifyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, source) = load_config(cli.config.as_deref())?;
    if let Err(err) = init_tracing("vsimctl", &config.logging) {
        vsim_logging::init();
        warn!(error = %err, "file logging unavailable, console only");
    }
    match &source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found, using defaults"),
    }

    match cli.command {
        Commands::BuildAssets(args) => assets::build_assets(&config, &args).await,
        Commands::BuildStaff(args) => assets::build_staff(&config, &args),
        Commands::Emit => emit::emit(&config).await,
        Commands::Serve => emit::serve(&config).await,
        Commands::Classify(args) => assets::classify(&config, &args),
    }
}

/// An explicit `--config` must exist; otherwise fall back to defaults when
/// neither `VSIM_CONFIG` nor the default path is present.
fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Option<PathBuf>)> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(path) => vec![path.to_path_buf()],
        None => vec![PathBuf::from(DEFAULT_CONFIG_PATH)],
    };
    match AppConfig::load_with_source(&candidates) {
        Ok(loaded) => Ok((loaded.config, Some(loaded.source))),
        Err(ConfigError::NotFound(_)) if explicit.is_none() => Ok((AppConfig::default(), None)),
        Err(err) => Err(err).context("failed to load configuration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn classify_arguments_parse() {
        let cli = Cli::try_parse_from(["vsimctl", "classify", "--lat", "135", "--lng", "60"])
            .unwrap();
        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.lat, 135.0);
                assert_eq!(args.lng, 60.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn build_staff_arguments_parse() {
        let cli = Cli::try_parse_from(["vsimctl", "build-staff", "--managers", "2", "--seed", "9"])
            .unwrap();
        match cli.command {
            Commands::BuildStaff(args) => {
                assert_eq!(args.staff, 17);
                assert_eq!(args.managers, 2);
                assert_eq!(args.seed, Some(9));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}

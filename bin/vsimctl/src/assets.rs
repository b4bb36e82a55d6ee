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
use clap::Args;
use serde_json::json;
use tracing::info;
use vsim_common::AppConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use vsim_grid_builder::{build, AssetGraph, AssetType, Blueprint, RosterPlan, SubType, STAFF_DATABASE};
use vsim_persistence::{open_store, write_assets, StoreParams};

use crate::emit::{registry_for, write_textfile};

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Write the asset array to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also bulk-write the assets to the configured store
    #[arg(long)]
    pub write_store: bool,
}

#[derive(Debug, Args)]
pub struct StaffArgs {
    /// Write the roster documents to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 17)]
    pub staff: usize,

    #[arg(long, default_value_t = 3)]
    pub managers: usize,

    /// Seed for the roster draw; falls back to `emission.seed`
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
}

/// Build and validate the configured venue.
pub fn venue_graph(config: &AppConfig) -> Result<AssetGraph> {
    let graph = build(&Blueprint::from_config(&config.venue));
    graph.validate().context("built asset graph is inconsistent")?;
    Ok(graph)
}

pub async fn build_assets(config: &AppConfig, args: &BuildArgs) -> Result<()> {
    let graph = venue_graph(config)?;
    let areas = graph.count_type(AssetType::Area);
    let bins = graph.count_sub_type(SubType::GarbageBin);
    let stands = graph.count_sub_type(SubType::HandwashStand);
    let assets = graph.into_assets();

    let json = serde_json::to_string_pretty(&assets)?;
    match &args.output {
        Some(path) => {
            export(path, &json)?;
            info!(path = %path.display(), assets = assets.len(), "assets exported");
        }
        None if !args.write_store => println!("{json}"),
        None => {}
    }

    if args.write_store {
        let registry = registry_for(config);
        let metrics = match &registry {
            Some(registry) => Some(vsim_persistence::StoreMetrics::register(registry)?),
            None => None,
        };
        let params = StoreParams::from_config(&config.store)?;
        let store = open_store(&params)?;
        write_assets(store.as_ref(), &assets, metrics.as_ref())
            .await
            .context("failed to persist asset graph")?;
        if let Some(registry) = &registry {
            write_textfile(config, registry)?;
        }
    }

    eprintln!(
        "built {} assets ({} areas, {} garbage bins, {} handwash stands)",
        assets.len(),
        areas,
        bins,
        stands
    );
    Ok(())
}

/// Draw the staff roster for the configured venue and export it as the
/// staff database document array.
pub fn build_staff(config: &AppConfig, args: &StaffArgs) -> Result<()> {
    let graph = venue_graph(config)?;
    let mut rng = match args.seed.or(config.emission.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let plan = RosterPlan {
        staff: args.staff,
        managers: args.managers,
    };
    let roster = plan
        .generate(&graph, &mut rng)
        .context("unable to station the staff roster")?;

    let json = serde_json::to_string_pretty(&roster)?;
    match &args.output {
        Some(path) => {
            export(path, &json)?;
            info!(
                path = %path.display(),
                database = STAFF_DATABASE,
                members = roster.len(),
                "staff roster exported"
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn export(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, json).with_context(|| format!("unable to write {}", path.display()))
}

pub fn classify(config: &AppConfig, args: &ClassifyArgs) -> Result<()> {
    let blueprint = Blueprint::from_config(&config.venue);
    let class = blueprint.rules.classify(args.lat, args.lng);
    let parent = class.parent.map(|zone| blueprint.naming.parent_id(zone));
    let report = json!({
        "lat": args.lat,
        "lng": args.lng,
        "subType": class.sub_type,
        "parent": parent,
        "coef": class.coefficient,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

//! ---
//! vsim_section: "11-simulation"
//! vsim_subsection: "tests"
//! vsim_type: "test"
//! vsim_scope: "code"
//! vsim_description: "Telemetry generation over the reference venue."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use vsim_grid_builder::{build, Asset, AssetType, Blueprint};
use vsim_sim::{device_for, DeviceFleet, DeviceType, Payload};

const PERIOD: Duration = Duration::from_millis(30_000);

#[test]
fn batch_mix_matches_venue_inventory() {
    let graph = build(&Blueprint::venue_default());
    let fleet = DeviceFleet::from_assets(graph.iter(), PERIOD).unwrap();
    let mut rng = StdRng::seed_from_u64(2020);
    let batch = fleet.generate_batch(0, &mut rng);

    let mut by_type: HashMap<DeviceType, usize> = HashMap::new();
    for event in &batch {
        *by_type.entry(event.device_type).or_default() += 1;
        assert!(event.device_id.starts_with(event.device_type.as_str()));
        assert!(event.device_id.ends_with(event.data.payload.subject()));
    }
    assert_eq!(by_type[&DeviceType::AreaPeopleCounter], 477);
    assert_eq!(by_type[&DeviceType::GarbageBinMonitor], 9);
    assert_eq!(by_type[&DeviceType::HandwashMonitor], 4);
}

#[test]
fn low_coefficient_cells_stay_under_cap() {
    let graph = build(&Blueprint::venue_default());
    let zero_coef: Vec<&Asset> = graph
        .iter()
        .filter(|a| a.asset_type == AssetType::Area && a.coefficient() == 0.0)
        .collect();
    assert!(!zero_coef.is_empty());
    let fleet = DeviceFleet::from_assets(zero_coef, PERIOD).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    for round in 0..50 {
        for event in fleet.generate_batch(round, &mut rng) {
            match event.data.payload {
                Payload::Congestion { count, .. } => assert!(count < 50),
                other => panic!("unexpected payload {other:?}"),
            }
        }
    }
}

#[test]
fn line_assets_get_line_counters() {
    let graph = build(&Blueprint::venue_default());
    let mut line = graph.get("congestion-0-0").unwrap().clone();
    line.id = "gate-north".into();
    line.asset_type = AssetType::Line;
    line.sub_type = None;
    let sensor = device_for(&line, PERIOD).unwrap();
    assert_eq!(sensor.device_type(), DeviceType::LinePeopleCounter);
    assert_eq!(sensor.device_id(), "line_people_counter-gate-north");
}

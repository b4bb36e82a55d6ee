//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Synthetic roster of store staff and managers stationed in the venue.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph::{AssetGraph, GraphError};
use crate::model::AssetType;

/// Database the roster is exported as.
pub const STAFF_DATABASE: &str = "assets_staff";

const DEVICE_PREFIX: &str = "D8AA1D5F-A10E-4C09-98BA-BD481709E";
const FIRST_DEVICE_SERIAL: usize = 11;

const STAFF_ROLES: &[&str] = &[
    "counter",
    "aisle-arrangement",
    "store-cleaning",
    "ware-house",
    "toilet-cleaning",
];
const MANAGER_ROLES: &[&str] = &["logistics", "customer-service", "orders"];

// two-hour shifts starting every hour from 9:00 to 20:00
const STAFF_SHIFTS: &[(&str, &str)] = &[
    ("9:00:00", "11:00:00"),
    ("10:00:00", "12:00:00"),
    ("11:00:00", "13:00:00"),
    ("12:00:00", "14:00:00"),
    ("13:00:00", "15:00:00"),
    ("14:00:00", "16:00:00"),
    ("15:00:00", "17:00:00"),
    ("16:00:00", "18:00:00"),
    ("17:00:00", "19:00:00"),
    ("18:00:00", "20:00:00"),
    ("19:00:00", "21:00:00"),
    ("20:00:00", "22:00:00"),
];
const MANAGER_SHIFTS: &[(&str, &str)] = &[("9:00:00", "17:00:00"), ("14:00:00", "22:00:00")];

/// Position of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffKind {
    Staff,
    Manager,
}

impl StaffKind {
    fn id_prefix(self) -> &'static str {
        match self {
            StaffKind::Staff => "st",
            StaffKind::Manager => "mg",
        }
    }

    fn roles(self) -> &'static [&'static str] {
        match self {
            StaffKind::Staff => STAFF_ROLES,
            StaffKind::Manager => MANAGER_ROLES,
        }
    }

    fn shifts(self) -> &'static [(&'static str, &'static str)] {
        match self {
            StaffKind::Staff => STAFF_SHIFTS,
            StaffKind::Manager => MANAGER_SHIFTS,
        }
    }

    /// Staff work in area cells, managers are assigned a whole floor.
    fn station(self) -> AssetType {
        match self {
            StaffKind::Staff => AssetType::Area,
            StaffKind::Manager => AssetType::Floor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub start: String,
    pub end: String,
}

/// Current shift plus minutes on the job and since the last rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duty {
    pub slot: Shift,
    pub on_job: u32,
    pub last_rest: u32,
}

/// One roster document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(rename = "type")]
    pub kind: StaffKind,
    pub id: String,
    pub device_id: Vec<String>,
    pub roles: Vec<String>,
    pub belongs: String,
    pub duration: Duty,
}

/// Headcount of the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterPlan {
    pub staff: usize,
    pub managers: usize,
}

impl Default for RosterPlan {
    fn default() -> Self {
        Self {
            staff: 17,
            managers: 3,
        }
    }
}

impl RosterPlan {
    /// Draw a roster stationed in `graph`. Staff come first, then managers;
    /// wearable serials run on across both.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        graph: &AssetGraph,
        rng: &mut R,
    ) -> Result<Vec<StaffMember>, GraphError> {
        let mut roster = Vec::with_capacity(self.staff + self.managers);
        for (kind, count) in [(StaffKind::Staff, self.staff), (StaffKind::Manager, self.managers)] {
            if count == 0 {
                continue;
            }
            let stations: Vec<&str> = graph
                .iter()
                .filter(|asset| asset.asset_type == kind.station())
                .map(|asset| asset.id.as_str())
                .collect();
            if stations.is_empty() {
                return Err(GraphError::NoStation(kind.station()));
            }
            for index in 1..=count {
                let serial = FIRST_DEVICE_SERIAL + roster.len();
                roster.push(member(kind, index, serial, &stations, rng));
            }
        }
        info!(
            staff = self.staff,
            managers = self.managers,
            "staff roster generated"
        );
        Ok(roster)
    }
}

fn member<R: Rng + ?Sized>(
    kind: StaffKind,
    index: usize,
    serial: usize,
    stations: &[&str],
    rng: &mut R,
) -> StaffMember {
    let catalogue = kind.roles();
    let draws = rng.gen_range(1..=3);
    let mut roles: Vec<String> = Vec::with_capacity(draws);
    for _ in 0..draws {
        let role = catalogue[rng.gen_range(0..catalogue.len())];
        if !roles.iter().any(|r| r == role) {
            roles.push(role.to_owned());
        }
    }

    let shifts = kind.shifts();
    let (start, end) = shifts[rng.gen_range(0..shifts.len())];
    StaffMember {
        kind,
        id: format!("{}{:04}", kind.id_prefix(), index),
        device_id: vec![format!("{}{:02}D", DEVICE_PREFIX, serial)],
        roles,
        belongs: stations[rng.gen_range(0..stations.len())].to_owned(),
        duration: Duty {
            slot: Shift {
                start: start.to_owned(),
                end: end.to_owned(),
            },
            on_job: rng.gen_range(10..=100),
            last_rest: rng.gen_range(0..=120),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, Blueprint, MapLayout};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn default_roster_is_stationed_in_the_venue() {
        let graph = build(&Blueprint::venue_default());
        let roster = RosterPlan::default()
            .generate(&graph, &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(roster.len(), 20);
        assert_eq!(roster[0].id, "st0001");
        assert_eq!(roster[16].id, "st0017");
        assert_eq!(roster[17].id, "mg0001");
        assert_eq!(roster[17].device_id, vec!["D8AA1D5F-A10E-4C09-98BA-BD481709E28D"]);

        let devices: HashSet<&str> = roster.iter().map(|m| m.device_id[0].as_str()).collect();
        assert_eq!(devices.len(), roster.len());

        for member in &roster {
            let station = graph.get(&member.belongs).unwrap();
            assert_eq!(station.asset_type, member.kind.station());
            assert!((1..=3).contains(&member.roles.len()));
            let unique: HashSet<&String> = member.roles.iter().collect();
            assert_eq!(unique.len(), member.roles.len());
            assert!(member.roles.iter().all(|r| member.kind.roles().contains(&r.as_str())));
            assert!((10..=100).contains(&member.duration.on_job));
            assert!(member.duration.last_rest <= 120);
        }
    }

    #[test]
    fn seeded_rosters_match() {
        let graph = build(&Blueprint::venue_default());
        let a = RosterPlan::default().generate(&graph, &mut StdRng::seed_from_u64(1));
        let b = RosterPlan::default().generate(&graph, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn documents_use_store_field_names() {
        let graph = build(&Blueprint::venue_default());
        let plan = RosterPlan {
            staff: 0,
            managers: 1,
        };
        let roster = plan.generate(&graph, &mut StdRng::seed_from_u64(2)).unwrap();
        let doc = serde_json::to_value(&roster[0]).unwrap();
        assert_eq!(doc["type"], "manager");
        assert_eq!(doc["belongs"], "imaginary-shopping-mall-1st-floor");
        assert!(doc["deviceId"].is_array());
        assert!(doc["duration"]["on_job"].is_u64());
        assert!(doc["duration"]["slot"]["start"].is_string());
    }

    #[test]
    fn venue_without_areas_cannot_host_staff() {
        let blueprint = Blueprint {
            layout: MapLayout {
                width: 0.0,
                height: 0.0,
                tile_width: 60.0,
                tile_height: 67.5,
            },
            ..Blueprint::venue_default()
        };
        let graph = build(&blueprint);
        let err = RosterPlan::default()
            .generate(&graph, &mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert_eq!(err, GraphError::NoStation(AssetType::Area));
    }
}

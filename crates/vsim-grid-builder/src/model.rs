//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node kinds of the venue hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Site,
    Building,
    Outside,
    Floor,
    Area,
    /// Line-crossing counter. Never synthesized by the builder.
    Line,
    Thing,
}

impl AssetType {
    /// Containers group other assets and never carry a device.
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            AssetType::Site | AssetType::Building | AssetType::Outside | AssetType::Floor
        )
    }

    pub fn slug(self) -> &'static str {
        match self {
            AssetType::Site => "site",
            AssetType::Building => "building",
            AssetType::Outside => "outside",
            AssetType::Floor => "floor",
            AssetType::Area => "area",
            AssetType::Line => "line",
            AssetType::Thing => "thing",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// The two mid-level containers that own area cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentZone {
    Outside,
    Floor,
}

impl fmt::Display for ParentZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentZone::Outside => f.write_str("outside"),
            ParentZone::Floor => f.write_str("floor"),
        }
    }
}

/// Refinement of [`AssetType`] for areas and things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubType {
    Parking,
    Roadway,
    Walkway,
    Toilet,
    Aisle,
    Shop,
    Unknown,
    GarbageBin,
    HandwashStand,
}

impl SubType {
    /// Container that owns areas of this sub-type. `None` for things and `unknown`.
    pub const fn owner(self) -> Option<ParentZone> {
        match self {
            SubType::Parking | SubType::Roadway | SubType::Walkway => Some(ParentZone::Outside),
            SubType::Toilet | SubType::Aisle | SubType::Shop => Some(ParentZone::Floor),
            SubType::Unknown | SubType::GarbageBin | SubType::HandwashStand => None,
        }
    }

    pub const fn is_thing(self) -> bool {
        matches!(self, SubType::GarbageBin | SubType::HandwashStand)
    }

    pub fn slug(self) -> &'static str {
        match self {
            SubType::Parking => "parking",
            SubType::Roadway => "roadway",
            SubType::Walkway => "walkway",
            SubType::Toilet => "toilet",
            SubType::Aisle => "aisle",
            SubType::Shop => "shop",
            SubType::Unknown => "unknown",
            SubType::GarbageBin => "garbage_bin",
            SubType::HandwashStand => "handwash_stand",
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Placement of an asset on the venue map, in map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapCoordinate {
    pub lat: f64,
    pub lng: f64,
    pub height: f64,
    pub width: f64,
}

/// Per-asset simulation parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Congestion coefficient for area cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coef: Option<f64>,
}

impl AssetSettings {
    pub fn with_coef(coef: f64) -> Self {
        Self { coef: Some(coef) }
    }
}

/// A node of the venue hierarchy as persisted in the asset store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<SubType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub belongs: Option<String>,
    #[serde(default)]
    pub belongings: Vec<String>,
    pub map_coordinate: MapCoordinate,
    /// Geographic placement; empty for synthesized assets.
    #[serde(default)]
    pub real_coordinate: Map<String, Value>,
    #[serde(default)]
    pub settings: AssetSettings,
    #[serde(default)]
    pub is_logical: bool,
}

impl Asset {
    pub fn is_container(&self) -> bool {
        self.asset_type.is_container()
    }

    /// Congestion coefficient, treating absent and zero the same way.
    pub fn coefficient(&self) -> f64 {
        self.settings.coef.unwrap_or(0.0)
    }
}

/// Cell id component: shortest decimal form, so `135.0` renders as `135`.
pub(crate) fn cell_id(kind: &str, lat: f64, lng: f64) -> String {
    format!("{}-{}-{}", kind, lat, lng)
}

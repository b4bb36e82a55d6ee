//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Asset graph builder.
//!
//! Produces the four fixed containers followed by one `area` per classified
//! cell (longitude outer loop, latitude inner loop) and the things installed
//! in it. Cells classified `unknown` are dropped together with their things.

use serde_json::Map;
use tracing::{debug, info, warn};
use vsim_common::config::VenueConfig;

use crate::classifier::ZoneRules;
use crate::graph::AssetGraph;
use crate::model::{cell_id, Asset, AssetSettings, AssetType, MapCoordinate, ParentZone, SubType};
use crate::placement::Placements;

const SITE_DESCRIPTION: &str = "shopping mall that involve you in the deam world";
const FLOOR_DESCRIPTION: &str = "1st floor of the imaginary shopping mall";
const AREA_DESCRIPTION: &str = "logical congestion area";
const GARBAGE_BIN_DESCRIPTION: &str = "garbage bin monitoring for disinfection";
const HANDWASH_DESCRIPTION: &str = "hand washing monitoring for sanitization";

/// Id and display-name prefixes of the fixed containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteNaming {
    pub prefix: String,
    pub name_prefix: String,
}

impl SiteNaming {
    pub fn site_id(&self) -> String {
        self.prefix.clone()
    }

    pub fn building_id(&self) -> String {
        format!("{}-building", self.prefix)
    }

    pub fn outside_id(&self) -> String {
        format!("{}-outside", self.prefix)
    }

    pub fn floor_id(&self) -> String {
        format!("{}-1st-floor", self.prefix)
    }

    pub fn parent_id(&self, zone: ParentZone) -> String {
        match zone {
            ParentZone::Outside => self.outside_id(),
            ParentZone::Floor => self.floor_id(),
        }
    }
}

impl Default for SiteNaming {
    fn default() -> Self {
        Self {
            prefix: "imaginary-shopping-mall".to_owned(),
            name_prefix: "dreamy-shopping-mall".to_owned(),
        }
    }
}

/// Map size and tile size in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapLayout {
    pub width: f64,
    pub height: f64,
    pub tile_width: f64,
    pub tile_height: f64,
}

impl MapLayout {
    /// Cell origins as `(lat, lng)`, longitude outer and latitude inner.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let columns = steps(self.width, self.tile_width);
        let rows = steps(self.height, self.tile_height);
        (0..columns).flat_map(move |col| {
            let lng = col as f64 * self.tile_width;
            (0..rows).map(move |row| (row as f64 * self.tile_height, lng))
        })
    }

    fn full_map(&self) -> MapCoordinate {
        MapCoordinate {
            lat: 0.0,
            lng: 0.0,
            height: self.height,
            width: self.width,
        }
    }
}

impl Default for MapLayout {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            tile_width: 60.0,
            tile_height: 67.5,
        }
    }
}

/// Number of tile origins `k * tile` with `k * tile < extent`.
fn steps(extent: f64, tile: f64) -> u64 {
    if !tile.is_finite() || !extent.is_finite() || tile <= 0.0 || extent <= 0.0 {
        return 0;
    }
    let mut count = (extent / tile).ceil() as u64;
    while count > 0 && (count - 1) as f64 * tile >= extent {
        count -= 1;
    }
    count
}

/// Everything needed to synthesize a venue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Blueprint {
    pub naming: SiteNaming,
    pub layout: MapLayout,
    pub rules: ZoneRules,
    pub placements: Placements,
}

impl Blueprint {
    /// Reference shopping mall.
    pub fn venue_default() -> Self {
        Self {
            naming: SiteNaming::default(),
            layout: MapLayout::default(),
            rules: ZoneRules::venue_default(),
            placements: Placements::venue_default(),
        }
    }

    /// Reference zoning with naming and geometry taken from configuration.
    pub fn from_config(venue: &VenueConfig) -> Self {
        Self {
            naming: SiteNaming {
                prefix: venue.site_prefix.clone(),
                name_prefix: venue.site_name_prefix.clone(),
            },
            layout: MapLayout {
                width: venue.map_width,
                height: venue.map_height,
                tile_width: venue.tile_width,
                tile_height: venue.tile_height,
            },
            rules: ZoneRules::venue_default(),
            placements: Placements::venue_default(),
        }
    }
}

fn container(
    id: String,
    name: String,
    description: &str,
    asset_type: AssetType,
    belongs: Option<String>,
    belongings: Vec<String>,
    layout: &MapLayout,
) -> Asset {
    Asset {
        id,
        name,
        description: description.to_owned(),
        asset_type,
        sub_type: None,
        belongs,
        belongings,
        map_coordinate: layout.full_map(),
        real_coordinate: Map::new(),
        settings: AssetSettings::default(),
        is_logical: true,
    }
}

fn containers(naming: &SiteNaming, layout: &MapLayout) -> [Asset; 4] {
    let name = |suffix: &str| {
        if suffix.is_empty() {
            naming.name_prefix.clone()
        } else {
            format!("{}-{}", naming.name_prefix, suffix)
        }
    };
    [
        container(
            naming.site_id(),
            name(""),
            SITE_DESCRIPTION,
            AssetType::Site,
            None,
            vec![naming.building_id(), naming.outside_id()],
            layout,
        ),
        container(
            naming.building_id(),
            name("building"),
            SITE_DESCRIPTION,
            AssetType::Building,
            Some(naming.site_id()),
            vec![naming.floor_id()],
            layout,
        ),
        container(
            naming.outside_id(),
            name("outside"),
            SITE_DESCRIPTION,
            AssetType::Outside,
            Some(naming.site_id()),
            Vec::new(),
            layout,
        ),
        container(
            naming.floor_id(),
            name("1st-floor"),
            FLOOR_DESCRIPTION,
            AssetType::Floor,
            Some(naming.building_id()),
            Vec::new(),
            layout,
        ),
    ]
}

fn cell(layout: &MapLayout, lat: f64, lng: f64) -> MapCoordinate {
    MapCoordinate {
        lat,
        lng,
        height: layout.tile_height,
        width: layout.tile_width,
    }
}

fn thing(sub_type: SubType, area_id: &str, lat: f64, lng: f64, layout: &MapLayout) -> Asset {
    let (kind, description) = match sub_type {
        SubType::HandwashStand => ("sanitization", HANDWASH_DESCRIPTION),
        _ => ("disinfection", GARBAGE_BIN_DESCRIPTION),
    };
    let id = cell_id(kind, lat, lng);
    Asset {
        name: id.clone(),
        id,
        description: description.to_owned(),
        asset_type: AssetType::Thing,
        sub_type: Some(sub_type),
        belongs: Some(area_id.to_owned()),
        belongings: Vec::new(),
        map_coordinate: cell(layout, lat, lng),
        real_coordinate: Map::new(),
        settings: AssetSettings::default(),
        is_logical: true,
    }
}

/// Synthesize the venue asset graph. Deterministic for a given blueprint.
pub fn build(blueprint: &Blueprint) -> AssetGraph {
    let Blueprint {
        naming,
        layout,
        rules,
        placements,
    } = blueprint;

    let mut ordered: Vec<Asset> = containers(naming, layout).into();
    let mut skipped_cells = 0usize;

    for (lat, lng) in layout.cells() {
        let class = rules.classify(lat, lng);
        let Some(parent) = class.parent else {
            skipped_cells += 1;
            continue;
        };

        let area_id = cell_id("congestion", lat, lng);
        let mut area = Asset {
            id: area_id.clone(),
            name: area_id.clone(),
            description: AREA_DESCRIPTION.to_owned(),
            asset_type: AssetType::Area,
            sub_type: Some(class.sub_type),
            belongs: Some(naming.parent_id(parent)),
            belongings: Vec::new(),
            map_coordinate: cell(layout, lat, lng),
            real_coordinate: Map::new(),
            settings: AssetSettings::with_coef(class.coefficient),
            is_logical: true,
        };

        let mut things = Vec::new();
        for kind in placements.things_at(lat, lng) {
            if parent != ParentZone::Floor {
                warn!(area = %area_id, thing = %kind, "skipping thing placed outside the building");
                continue;
            }
            let asset = thing(kind, &area_id, lat, lng, layout);
            area.belongings.push(asset.id.clone());
            things.push(asset);
        }

        ordered.push(area);
        ordered.extend(things);
    }

    let zone_members = |zone: ParentZone| -> Vec<String> {
        ordered
            .iter()
            .filter(|a| a.asset_type == AssetType::Area)
            .filter(|a| a.sub_type.and_then(SubType::owner) == Some(zone))
            .map(|a| a.id.clone())
            .collect()
    };
    let outside_members = zone_members(ParentZone::Outside);
    let floor_members = zone_members(ParentZone::Floor);

    let mut graph = AssetGraph::new();
    for asset in ordered {
        // ids are unique by construction: one area and at most one thing per kind per cell
        if let Err(err) = graph.insert(asset) {
            debug!(error = %err, "dropping duplicate asset");
        }
    }
    if let Some(outside) = graph.get_mut(&naming.outside_id()) {
        outside.belongings = outside_members;
    }
    if let Some(floor) = graph.get_mut(&naming.floor_id()) {
        floor.belongings = floor_members;
    }

    info!(
        site = %naming.prefix,
        assets = graph.len(),
        areas = graph.count_type(AssetType::Area),
        things = graph.count_type(AssetType::Thing),
        skipped_cells,
        "asset graph built"
    );
    graph
}

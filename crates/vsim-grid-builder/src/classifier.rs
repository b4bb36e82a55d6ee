//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Grid classifier: maps a cell origin to a zone via ordered rectangle rules.

use serde::{Deserialize, Serialize};

use crate::graph::GraphError;
use crate::model::{ParentZone, SubType};

/// Coefficient assigned to cells no rule matches.
pub const DEFAULT_COEFFICIENT: f64 = 0.6;

/// Half-open rectangle: `lng ∈ [lng_min, lng_max)` and `lat ∈ [lat_min, lat_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub lng_min: f64,
    pub lat_min: f64,
    pub lng_max: f64,
    pub lat_max: f64,
}

impl Rect {
    pub const fn new(lng_min: f64, lat_min: f64, lng_max: f64, lat_max: f64) -> Self {
        Self {
            lng_min,
            lat_min,
            lng_max,
            lat_max,
        }
    }

    /// Rectangle covering exactly one tile whose origin is `(lat, lng)`.
    pub fn cell(lat: f64, lng: f64, tile_width: f64, tile_height: f64) -> Self {
        Self::new(lng, lat, lng + tile_width, lat + tile_height)
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lng >= self.lng_min && lat >= self.lat_min && lng < self.lng_max && lat < self.lat_max
    }

    pub fn is_empty(&self) -> bool {
        self.lng_max <= self.lng_min || self.lat_max <= self.lat_min
    }
}

/// One classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub rect: Rect,
    pub sub_type: SubType,
    pub parent: ParentZone,
    pub coefficient: f64,
}

/// Outcome of classifying a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub sub_type: SubType,
    pub parent: Option<ParentZone>,
    pub coefficient: f64,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        sub_type: SubType::Unknown,
        parent: None,
        coefficient: DEFAULT_COEFFICIENT,
    };

    pub fn is_unknown(&self) -> bool {
        self.sub_type == SubType::Unknown
    }
}

/// Ordered rule list. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ZoneRule>", into = "Vec<ZoneRule>")]
pub struct ZoneRules {
    rules: Vec<ZoneRule>,
}

impl ZoneRules {
    /// Build a rule list, checking that each rule's parent owns its sub-type
    /// and that coefficients lie in `[0, 1]`.
    pub fn new(rules: Vec<ZoneRule>) -> Result<Self, GraphError> {
        for (index, rule) in rules.iter().enumerate() {
            if rule.sub_type.owner() != Some(rule.parent) {
                return Err(GraphError::InvalidRule {
                    index,
                    reason: format!(
                        "sub-type {} is not owned by {}",
                        rule.sub_type, rule.parent
                    ),
                });
            }
            if !(0.0..=1.0).contains(&rule.coefficient) {
                return Err(GraphError::InvalidRule {
                    index,
                    reason: format!("coefficient {} outside [0, 1]", rule.coefficient),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Zoning of the reference shopping mall (1920x1080 map, 60x67.5 tiles).
    pub fn venue_default() -> Self {
        let rules = VENUE_TABLE
            .iter()
            .map(|&(lng_min, lat_min, lng_max, lat_max, sub_type, coefficient)| ZoneRule {
                rect: Rect::new(lng_min, lat_min, lng_max, lat_max),
                sub_type,
                parent: match sub_type.owner() {
                    Some(parent) => parent,
                    None => ParentZone::Floor,
                },
                coefficient,
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[ZoneRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify the cell whose origin is `(lat, lng)`. Never fails.
    pub fn classify(&self, lat: f64, lng: f64) -> Classification {
        self.rules
            .iter()
            .find(|rule| rule.rect.contains(lat, lng))
            .map(|rule| Classification {
                sub_type: rule.sub_type,
                parent: Some(rule.parent),
                coefficient: rule.coefficient,
            })
            .unwrap_or(Classification::UNKNOWN)
    }
}

impl TryFrom<Vec<ZoneRule>> for ZoneRules {
    type Error = GraphError;

    fn try_from(rules: Vec<ZoneRule>) -> Result<Self, Self::Error> {
        Self::new(rules)
    }
}

impl From<ZoneRules> for Vec<ZoneRule> {
    fn from(rules: ZoneRules) -> Self {
        rules.rules
    }
}

impl Default for ZoneRules {
    fn default() -> Self {
        Self::venue_default()
    }
}

use SubType::{Aisle, Parking, Roadway, Shop, Toilet};

// (lng_min, lat_min, lng_max, lat_max, sub-type, coefficient), evaluated top to bottom.
// Several entries are fully shadowed by earlier ones; they are kept so the
// table mirrors the venue drawing.
#[rustfmt::skip]
const VENUE_TABLE: &[(f64, f64, f64, f64, SubType, f64)] = &[
    // south edge: parking and access roads
    (0.0, 945.0, 60.0, 1080.0, Parking, 0.0),
    (60.0, 945.0, 840.0, 1080.0, Parking, 0.3),
    (0.0, 945.0, 60.0, 1080.0, Roadway, 0.0),
    (60.0, 945.0, 960.0, 1080.0, Roadway, 0.3),
    (0.0, 877.5, 60.0, 1080.0, Roadway, 0.0),
    (60.0, 877.5, 960.0, 1080.0, Roadway, 0.3),
    (840.0, 742.5, 960.0, 877.5, Roadway, 0.6),
    (960.0, 810.0, 1620.0, 1080.0, Parking, 0.3),
    (1620.0, 810.0, 1680.0, 1012.5, Parking, 0.3),
    (1680.0, 810.0, 1740.0, 877.5, Parking, 0.3),
    (1680.0, 877.5, 1740.0, 945.0, Parking, 0.3),
    (960.0, 742.5, 1740.0, 810.0, Roadway, 0.3),
    // north edge
    (0.0, 0.0, 60.0, 202.5, Parking, 0.0),
    (60.0, 0.0, 420.0, 202.5, Parking, 0.3),
    (0.0, 202.5, 60.0, 270.0, Roadway, 0.0),
    (60.0, 202.5, 480.0, 270.0, Roadway, 0.3),
    (420.0, 135.0, 480.0, 202.5, Roadway, 0.3),
    (420.0, 0.0, 1260.0, 135.0, Roadway, 0.3),
    (1260.0, 67.5, 1740.0, 135.0, Roadway, 0.3),
    (1740.0, 67.5, 1800.0, 135.0, Roadway, 0.0),
    (1620.0, 135.0, 1740.0, 270.0, Roadway, 0.3),
    (1740.0, 135.0, 1920.0, 270.0, Roadway, 0.0),
    (1740.0, 742.5, 1800.0, 877.5, Roadway, 0.3),
    // west wing
    (0.0, 270.0, 60.0, 405.0, Toilet, 0.0),
    (60.0, 270.0, 120.0, 337.5, Toilet, 0.3),
    (60.0, 337.5, 120.0, 405.0, Toilet, 0.6),
    (120.0, 270.0, 480.0, 337.5, Aisle, 0.3),
    (480.0, 270.0, 540.0, 337.5, Aisle, 0.6),
    (120.0, 337.5, 540.0, 405.0, Aisle, 0.6),
    (0.0, 405.0, 60.0, 877.5, Shop, 0.0),
    (60.0, 405.0, 300.0, 540.0, Shop, 0.6),
    (60.0, 540.0, 240.0, 742.5, Shop, 0.6),
    (240.0, 540.0, 300.0, 742.5, Shop, 0.9),
    (60.0, 742.5, 300.0, 877.5, Shop, 0.6),
    (300.0, 405.0, 360.0, 540.0, Aisle, 0.6),
    (300.0, 540.0, 360.0, 742.5, Aisle, 0.9),
    (300.0, 742.5, 360.0, 877.5, Aisle, 0.6),
    (360.0, 405.0, 840.0, 540.0, Shop, 0.6),
    (360.0, 540.0, 600.0, 607.5, Shop, 0.9),
    (600.0, 540.0, 840.0, 607.5, Shop, 0.6),
    (360.0, 607.5, 600.0, 675.0, Aisle, 0.9),
    (600.0, 607.5, 840.0, 675.0, Aisle, 0.6),
    (360.0, 675.0, 600.0, 742.5, Shop, 0.9),
    (600.0, 675.0, 840.0, 742.5, Shop, 0.6),
    (360.0, 742.5, 840.0, 877.5, Shop, 0.6),
    // central block
    (480.0, 135.0, 540.0, 270.0, Aisle, 0.6),
    (540.0, 135.0, 960.0, 337.5, Shop, 0.6),
    (540.0, 337.5, 840.0, 405.0, Aisle, 0.6),
    (840.0, 337.5, 1020.0, 742.5, Aisle, 0.6),
    (960.0, 135.0, 1020.0, 405.0, Aisle, 0.6),
    (1020.0, 135.0, 1260.0, 337.5, Shop, 0.6),
    (1260.0, 135.0, 1320.0, 337.5, Aisle, 0.6),
    (1320.0, 135.0, 1500.0, 337.5, Shop, 0.6),
    (1500.0, 270.0, 1560.0, 337.5, Shop, 0.6),
    (1500.0, 135.0, 1560.0, 270.0, Toilet, 0.6),
    (1560.0, 135.0, 1620.0, 405.0, Aisle, 0.6),
    (1020.0, 337.5, 1500.0, 607.5, Aisle, 0.9),
    (1500.0, 337.5, 1560.0, 607.5, Aisle, 0.6),
    (1020.0, 607.5, 1560.0, 742.5, Shop, 0.6),
    (1560.0, 405.0, 1620.0, 742.5, Shop, 0.6),
    // east wing
    (1620.0, 202.5, 1740.0, 270.0, Shop, 0.3),
    (1740.0, 202.5, 1800.0, 742.5, Shop, 0.0),
    (1620.0, 270.0, 1740.0, 742.5, Shop, 0.6),
    (1800.0, 270.0, 1860.0, 607.5, Shop, 0.0),
    (1860.0, 270.0, 1920.0, 405.5, Shop, 0.0),
];

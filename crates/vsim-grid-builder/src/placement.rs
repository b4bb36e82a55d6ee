//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::classifier::Rect;
use crate::model::SubType;

/// Allow-listed region where a thing of `sub_type` is installed in every cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThingPlacement {
    pub rect: Rect,
    pub sub_type: SubType,
}

/// Thing kinds emitted per cell, in this order.
const THING_ORDER: [SubType; 2] = [SubType::GarbageBin, SubType::HandwashStand];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placements {
    entries: Vec<ThingPlacement>,
}

impl Placements {
    pub fn new(entries: Vec<ThingPlacement>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Garbage bins and handwash stands of the reference shopping mall.
    pub fn venue_default() -> Self {
        const TILE_W: f64 = 60.0;
        const TILE_H: f64 = 67.5;
        const BINS: [(f64, f64); 9] = [
            (120.0, 270.0),
            (300.0, 810.0),
            (480.0, 135.0),
            (780.0, 270.0),
            (1260.0, 135.0),
            (1560.0, 135.0),
            (1380.0, 405.0),
            (1560.0, 540.0),
            (1800.0, 405.0),
        ];

        let mut entries: Vec<ThingPlacement> = BINS
            .iter()
            .map(|&(lng, lat)| ThingPlacement {
                rect: Rect::cell(lat, lng, TILE_W, TILE_H),
                sub_type: SubType::GarbageBin,
            })
            .collect();
        entries.push(ThingPlacement {
            rect: Rect::new(60.0, 270.0, 120.0, 405.0),
            sub_type: SubType::HandwashStand,
        });
        entries.push(ThingPlacement {
            rect: Rect::new(1500.0, 135.0, 1560.0, 270.0),
            sub_type: SubType::HandwashStand,
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[ThingPlacement] {
        &self.entries
    }

    /// Thing sub-types to install at the cell `(lat, lng)`: garbage bin first,
    /// then handwash stand, each at most once.
    pub fn things_at(&self, lat: f64, lng: f64) -> Vec<SubType> {
        THING_ORDER
            .iter()
            .copied()
            .filter(|kind| {
                self.entries
                    .iter()
                    .any(|p| p.sub_type == *kind && p.rect.contains(lat, lng))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_occupy_single_cells() {
        let placements = Placements::venue_default();
        assert_eq!(placements.things_at(270.0, 120.0), vec![SubType::GarbageBin]);
        assert!(placements.things_at(270.0, 180.0).is_empty());
        assert!(placements.things_at(337.5, 120.0).is_empty());
    }

    #[test]
    fn handwash_regions_span_two_cells() {
        let placements = Placements::venue_default();
        assert_eq!(placements.things_at(270.0, 60.0), vec![SubType::HandwashStand]);
        assert_eq!(placements.things_at(337.5, 60.0), vec![SubType::HandwashStand]);
        assert_eq!(placements.things_at(202.5, 1500.0), vec![SubType::HandwashStand]);
        assert!(placements.things_at(405.0, 60.0).is_empty());
    }

    #[test]
    fn bin_is_listed_before_stand() {
        let placements = Placements::new(vec![
            ThingPlacement {
                rect: Rect::new(0.0, 0.0, 60.0, 67.5),
                sub_type: SubType::HandwashStand,
            },
            ThingPlacement {
                rect: Rect::new(0.0, 0.0, 60.0, 67.5),
                sub_type: SubType::GarbageBin,
            },
        ]);
        assert_eq!(
            placements.things_at(0.0, 0.0),
            vec![SubType::GarbageBin, SubType::HandwashStand]
        );
    }
}

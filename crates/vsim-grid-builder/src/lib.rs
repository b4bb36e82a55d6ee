//! ---
//! vsim_section: "09-asset-graph"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Venue zoning and asset graph synthesis."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Builds the spatial asset hierarchy of the simulated venue.
//!
//! The venue map is tiled into cells; every cell is classified by an ordered
//! list of zone rules and becomes an `area` asset, optionally carrying `thing`
//! assets such as garbage bins and handwash stands.

pub mod builder;
pub mod classifier;
pub mod graph;
pub mod model;
pub mod placement;
pub mod staff;

pub use builder::{build, Blueprint, MapLayout, SiteNaming};
pub use classifier::{Classification, Rect, ZoneRule, ZoneRules, DEFAULT_COEFFICIENT};
pub use graph::{AssetGraph, GraphError};
pub use model::{Asset, AssetSettings, AssetType, MapCoordinate, ParentZone, SubType};
pub use placement::{Placements, ThingPlacement};
pub use staff::{Duty, RosterPlan, Shift, StaffKind, StaffMember, STAFF_DATABASE};

pub type Result<T> = std::result::Result<T, GraphError>;

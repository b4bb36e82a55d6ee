//! ---
//! vsim_section: "11-simulation"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Telemetry generator runtime helpers."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::time::Duration;

use rand::{Rng, RngCore};
use vsim_common::time::duration_to_millis;
use vsim_grid_builder::{Asset, AssetType, SubType};

use crate::event::{DeviceType, Payload};

const MAX_PEOPLE: f64 = 50.0;
const CONGESTION_CAP: f64 = 0.99;
const MAX_DEPTH: u32 = 100;
const MAX_DISPOSALS: f64 = 10.0;

/// A simulated device bound to one asset.
pub trait Sensor: Send + Sync {
    fn device_type(&self) -> DeviceType;

    fn asset_id(&self) -> &str;

    fn device_id(&self) -> String {
        format!("{}-{}", self.device_type(), self.asset_id())
    }

    /// Produce one reading from the random source.
    fn read(&self, rng: &mut dyn RngCore) -> Payload;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Area,
    Line,
}

/// People counter reporting how many visitors were seen during the last period.
#[derive(Debug, Clone)]
pub struct PeopleCounter {
    asset_id: String,
    kind: CounterKind,
    coef: f64,
    period_ms: u64,
}

impl PeopleCounter {
    pub fn new(asset_id: impl Into<String>, kind: CounterKind, coef: f64, period: Duration) -> Self {
        Self {
            asset_id: asset_id.into(),
            kind,
            coef,
            period_ms: duration_to_millis(period),
        }
    }

    /// `floor(min(0.99, r * (1 + coef)) * 50)`.
    pub fn count_for(&self, r: f64) -> u32 {
        let scaled = (r * (1.0 + self.coef)).min(CONGESTION_CAP);
        (scaled * MAX_PEOPLE).floor() as u32
    }
}

impl Sensor for PeopleCounter {
    fn device_type(&self) -> DeviceType {
        match self.kind {
            CounterKind::Area => DeviceType::AreaPeopleCounter,
            CounterKind::Line => DeviceType::LinePeopleCounter,
        }
    }

    fn asset_id(&self) -> &str {
        &self.asset_id
    }

    fn read(&self, rng: &mut dyn RngCore) -> Payload {
        let r: f64 = rng.gen();
        Payload::Congestion {
            area: self.asset_id.clone(),
            count: self.count_for(r),
            period: self.period_ms,
        }
    }
}

/// Fill-level monitor on a handwash stand's soap tank.
#[derive(Debug, Clone)]
pub struct HandwashMonitor {
    asset_id: String,
}

impl HandwashMonitor {
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
        }
    }
}

impl Sensor for HandwashMonitor {
    fn device_type(&self) -> DeviceType {
        DeviceType::HandwashMonitor
    }

    fn asset_id(&self) -> &str {
        &self.asset_id
    }

    fn read(&self, rng: &mut dyn RngCore) -> Payload {
        let r: f64 = rng.gen();
        let distance = (r * f64::from(MAX_DEPTH)).floor() as u32;
        let remaining = f64::from(MAX_DEPTH - distance) / f64::from(MAX_DEPTH);
        Payload::Sanitization {
            handwash_stand: self.asset_id.clone(),
            distance,
            max_depth: MAX_DEPTH,
            amount_rate: (remaining * 100.0).floor() as u32,
        }
    }
}

/// Counts disposals into a garbage bin during the last period.
#[derive(Debug, Clone)]
pub struct GarbageBinMonitor {
    asset_id: String,
    period_ms: u64,
}

impl GarbageBinMonitor {
    pub fn new(asset_id: impl Into<String>, period: Duration) -> Self {
        Self {
            asset_id: asset_id.into(),
            period_ms: duration_to_millis(period),
        }
    }
}

impl Sensor for GarbageBinMonitor {
    fn device_type(&self) -> DeviceType {
        DeviceType::GarbageBinMonitor
    }

    fn asset_id(&self) -> &str {
        &self.asset_id
    }

    fn read(&self, rng: &mut dyn RngCore) -> Payload {
        let r: f64 = rng.gen();
        Payload::Disinfection {
            garbage_bin: self.asset_id.clone(),
            count: (r * MAX_DISPOSALS).floor() as u32,
            period: self.period_ms,
        }
    }
}

/// Device installed on `asset`, or `None` when its `(type, subType)` has no device class.
pub fn device_for(asset: &Asset, period: Duration) -> Option<Box<dyn Sensor>> {
    match (asset.asset_type, asset.sub_type) {
        (AssetType::Area, _) => Some(Box::new(PeopleCounter::new(
            asset.id.clone(),
            CounterKind::Area,
            asset.coefficient(),
            period,
        ))),
        (AssetType::Line, _) => Some(Box::new(PeopleCounter::new(
            asset.id.clone(),
            CounterKind::Line,
            asset.coefficient(),
            period,
        ))),
        (AssetType::Thing, Some(SubType::GarbageBin)) => {
            Some(Box::new(GarbageBinMonitor::new(asset.id.clone(), period)))
        }
        (AssetType::Thing, Some(SubType::HandwashStand)) => {
            Some(Box::new(HandwashMonitor::new(asset.id.clone())))
        }
        _ => None,
    }
}

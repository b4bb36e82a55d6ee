//! ---
//! vsim_section: "11-simulation"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Telemetry generator runtime helpers."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::fmt;
use std::time::Duration;

use rand::RngCore;
use thiserror::Error;
use tracing::debug;
use vsim_common::time::batch_timestamp;
use vsim_grid_builder::{Asset, AssetType, SubType};

use crate::event::{Event, EventData, EventType};
use crate::sensor::{device_for, Sensor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("asset `{id}` ({asset_type}/{sub_type}) has no device class")]
    NoDevice {
        id: String,
        asset_type: AssetType,
        sub_type: SubTypeLabel,
    },
}

/// Display helper for an optional sub-type in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubTypeLabel(pub Option<SubType>);

impl fmt::Display for SubTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(sub_type) => write!(f, "{}", sub_type),
            None => f.write_str("-"),
        }
    }
}

/// Build the event for a single sensor reading at `time`.
fn emit(sensor: &dyn Sensor, time: i64, rng: &mut dyn RngCore) -> Event {
    Event {
        device_type: sensor.device_type(),
        device_id: sensor.device_id(),
        event_type: EventType::SendData,
        data: EventData {
            payload: sensor.read(rng),
            time,
        },
    }
}

/// Generate one event for `asset`. Containers and unsupported kinds are an error.
pub fn generate(
    asset: &Asset,
    period: Duration,
    time: i64,
    rng: &mut dyn RngCore,
) -> Result<Event, GenerationError> {
    let sensor = device_for(asset, period).ok_or_else(|| no_device(asset))?;
    Ok(emit(sensor.as_ref(), time, rng))
}

fn no_device(asset: &Asset) -> GenerationError {
    GenerationError::NoDevice {
        id: asset.id.clone(),
        asset_type: asset.asset_type,
        sub_type: SubTypeLabel(asset.sub_type),
    }
}

/// Devices of every non-container asset, in graph order.
pub struct DeviceFleet {
    sensors: Vec<Box<dyn Sensor>>,
}

impl fmt::Debug for DeviceFleet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceFleet")
            .field("sensors", &self.sensors.len())
            .finish()
    }
}

impl DeviceFleet {
    /// Attach a device to every non-container asset.
    ///
    /// Fails on the first non-container asset without a device class, so a
    /// malformed graph is rejected before anything is emitted.
    pub fn from_assets<'a, I>(assets: I, period: Duration) -> Result<Self, GenerationError>
    where
        I: IntoIterator<Item = &'a Asset>,
    {
        let mut sensors = Vec::new();
        for asset in assets {
            if asset.is_container() {
                continue;
            }
            let sensor = device_for(asset, period).ok_or_else(|| no_device(asset))?;
            sensors.push(sensor);
        }
        debug!(devices = sensors.len(), "device fleet assembled");
        Ok(Self { sensors })
    }

    pub fn from_sensors(sensors: Vec<Box<dyn Sensor>>) -> Self {
        Self { sensors }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn sensors(&self) -> impl Iterator<Item = &dyn Sensor> {
        self.sensors.iter().map(|s| s.as_ref())
    }

    /// One event per device; the `i`-th event is stamped `base_ms + i`.
    pub fn generate_batch(&self, base_ms: i64, rng: &mut dyn RngCore) -> Vec<Event> {
        self.sensors
            .iter()
            .enumerate()
            .map(|(index, sensor)| emit(sensor.as_ref(), batch_timestamp(base_ms, index), rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use vsim_grid_builder::{build, Blueprint};

    const PERIOD: Duration = Duration::from_millis(30_000);

    #[test]
    fn fleet_covers_every_device_asset() {
        let graph = build(&Blueprint::venue_default());
        let fleet = DeviceFleet::from_assets(graph.iter(), PERIOD).unwrap();
        assert_eq!(fleet.len(), 490);
    }

    #[test]
    fn batch_timestamps_increase_by_index() {
        let graph = build(&Blueprint::venue_default());
        let fleet = DeviceFleet::from_assets(graph.iter(), PERIOD).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let batch = fleet.generate_batch(1_000, &mut rng);
        assert_eq!(batch.len(), 490);
        for (i, event) in batch.iter().enumerate() {
            assert_eq!(event.data.time, 1_000 + i as i64);
            assert_eq!(event.event_type, EventType::SendData);
        }
        assert_eq!(batch[0].device_id, "area_people_counter-congestion-0-0");
    }

    #[test]
    fn seeded_batches_are_reproducible() {
        let graph = build(&Blueprint::venue_default());
        let fleet = DeviceFleet::from_assets(graph.iter(), PERIOD).unwrap();
        let a = fleet.generate_batch(0, &mut StdRng::seed_from_u64(99));
        let b = fleet.generate_batch(0, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn thing_without_known_sub_type_is_rejected() {
        let graph = build(&Blueprint::venue_default());
        let mut stray = graph.get("disinfection-270-120").unwrap().clone();
        stray.sub_type = None;
        let err = DeviceFleet::from_assets([&stray], PERIOD).unwrap_err();
        assert!(matches!(err, GenerationError::NoDevice { ref id, .. } if id == "disinfection-270-120"));
        assert!(err.to_string().contains("thing/-"));
    }

    #[test]
    fn generate_rejects_containers() {
        let graph = build(&Blueprint::venue_default());
        let site = graph.get("imaginary-shopping-mall").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(generate(site, PERIOD, 0, &mut rng).is_err());
        let area = graph.get("congestion-0-0").unwrap();
        let event = generate(area, PERIOD, 5, &mut rng).unwrap();
        assert_eq!(event.data.time, 5);
    }
}

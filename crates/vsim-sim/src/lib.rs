//! ---
//! vsim_section: "11-simulation"
//! vsim_subsection: "01-bootstrap"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Telemetry generator module exports and shared types."
//! vsim_version: "v0.1.0"
//! vsim_owner: "tbd"
//! ---
//! Synthetic telemetry for venue assets.
//!
//! Every non-container asset maps to one device class implementing
//! [`Sensor`]. A [`DeviceFleet`] holds the devices of a graph and turns a
//! random source into a batch of [`Event`]s.

pub mod event;
pub mod fleet;
pub mod sensor;

pub use event::{DeviceType, Event, EventData, EventType, Payload};
pub use fleet::{generate, DeviceFleet, GenerationError};
pub use sensor::{
    device_for, CounterKind, GarbageBinMonitor, HandwashMonitor, PeopleCounter, Sensor,
};

pub type Result<T> = std::result::Result<T, GenerationError>;

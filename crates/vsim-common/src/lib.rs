//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Shared primitives and utilities for the simulation runtime."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Core shared primitives for the venue simulation workspace.
//! This crate exposes configuration loading, tracing initialisation, and
//! timestamp helpers consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    AppConfig, BusConfig, ConfigError, EmissionConfig, LoadedAppConfig, LoggingConfig,
    MetricsConfig, SinkConfig, StoreConfig, VenueConfig,
};
pub use logging::{init_tracing, LogFormat};

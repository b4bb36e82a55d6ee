//! ---
//! vsim_section: "01-core-functionality"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Periodic emission scheduling and trigger handling."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! Emission scheduler and the trigger runner that feeds it from the asset store.

use vsim_common::ConfigError;
use vsim_msg::TransportError;
use vsim_persistence::StoreError;
use vsim_sim::GenerationError;

pub mod metrics;
pub mod runner;
pub mod scheduler;

pub use metrics::{CoreMetrics, EmissionMetrics};
pub use runner::TriggerRunner;
pub use scheduler::{EmissionScheduler, PassReport, SchedulerState, NO_ASSETS_MESSAGE};

pub type Result<T> = std::result::Result<T, EmissionError>;

/// Failure of one trigger invocation.
#[derive(Debug, thiserror::Error)]
pub enum EmissionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

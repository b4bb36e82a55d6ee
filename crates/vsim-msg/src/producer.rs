//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::credentials::BusCredentials;
use crate::{Result, TransportError};

/// Capacity of each producer's signal channel.
pub const SIGNAL_CAPACITY: usize = 16;

/// Connection state changes reported by a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerSignal {
    /// The producer is connected and accepts messages.
    Ready,
    /// The producer hit an unrecoverable error.
    Error(String),
    /// The broker set changed underneath the producer.
    TopologyChanged(String),
}

impl ProducerSignal {
    /// Map a signal to the error that fails an active run. `Ready` maps to `None`.
    pub fn into_error(self) -> Option<TransportError> {
        match self {
            ProducerSignal::Ready => None,
            ProducerSignal::Error(reason) => Some(TransportError::Producer(reason)),
            ProducerSignal::TopologyChanged(reason) => Some(TransportError::TopologyChanged(reason)),
        }
    }
}

/// An open connection to the message bus.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Send one serialized message to `topic`.
    async fn send(&self, topic: &str, message: String) -> Result<()>;
    /// Subscribe to connection signals.
    fn subscribe(&self) -> broadcast::Receiver<ProducerSignal>;
    /// Human-readable producer name for logging/metrics.
    fn name(&self) -> &'static str;
}

/// Opens producers. Implementations return once the producer is ready.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a producer authenticated with `credentials`.
    async fn connect(&self, credentials: &BusCredentials) -> Result<Arc<dyn Producer>>;
}

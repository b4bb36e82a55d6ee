//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Message bus publishing for generated telemetry.
//!
//! A [`Connector`] opens one [`Producer`] per trigger run. Producers deliver
//! serialized events one message at a time and report connection trouble as
//! [`ProducerSignal`]s on a broadcast channel.

pub mod credentials;
pub mod memory;
pub mod metrics;
pub mod ndjson;
pub mod producer;
pub mod publish;

/// Shared result type for messaging operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Failures raised while connecting to or publishing on the message bus.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// One or more messages of a batch could not be delivered.
    #[error("failed to send {failed} of {total} messages: {}", .errors.join("; "))]
    Send {
        /// Number of failed messages.
        failed: usize,
        /// Size of the batch.
        total: usize,
        /// Per-message error descriptions, in batch order.
        errors: Vec<String>,
    },
    /// The producer rejected a single message.
    #[error("message rejected: {0}")]
    Rejected(String),
    /// The producer could not be opened.
    #[error("unable to connect producer: {0}")]
    Connect(String),
    /// The producer reported an error while the run was active.
    #[error("producer error: {0}")]
    Producer(String),
    /// The broker set changed while the run was active.
    #[error("broker topology changed: {0}")]
    TopologyChanged(String),
    /// The producer's signal channel closed.
    #[error("producer closed")]
    Closed,
    /// Wrapper for IO errors from file and stdout sinks.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub use credentials::BusCredentials;
pub use memory::{InMemoryConnector, InMemoryProducer, SentMessage};
pub use metrics::MessagingMetrics;
pub use ndjson::{NdjsonConnector, NdjsonProducer, NdjsonTarget};
pub use producer::{Connector, Producer, ProducerSignal};
pub use publish::push_batch;

//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Asset store abstractions and storage bindings."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Asset store readers and writers.
//!
//! The store keeps one JSON document per asset. Backends are selected by the
//! scheme of the configured URL: `memory://`, `file://<dir>` and `http(s)://`
//! for a CouchDB-compatible server.

use vsim_common::config::ConfigError;

/// Result alias used throughout the persistence crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for asset store operations. No operation is retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Wrapper for IO errors encountered while reading/writing store files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization issues.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Reported when a store file fails integrity verification.
    #[error("document file {0} failed integrity check")]
    HashMismatch(String),
    /// Fewer acknowledgements than documents, or some were rejected.
    #[error("might not write some data: {failed} of {total} documents not acknowledged")]
    PartialWrite {
        /// Documents missing an acknowledgement or acknowledged with an error.
        failed: usize,
        /// Documents submitted.
        total: usize,
    },
    /// The write request as a whole failed.
    #[error("bulk write failed: {0}")]
    WriteFailed(String),
    /// The store could not be reached or answered with an error.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Wrapper for HTTP client failures.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Connection parameters could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Wrapper for Prometheus metrics registration failures.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub mod couch;
pub mod file;
pub mod memory;
pub mod metrics;
pub mod params;
pub mod store;

pub use couch::CouchStore;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use metrics::StoreMetrics;
pub use params::{StoreLocation, StoreParams};
pub use store::{
    fetch_assets, open_store, verify_acks, write_assets, AssetStore, AssetStoreReader,
    AssetStoreWriter, StoredDocument, WriteAck,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_write_message_matches_log_wording() {
        let err = StoreError::PartialWrite {
            failed: 2,
            total: 10,
        };
        assert_eq!(
            format!("{err}"),
            "might not write some data: 2 of 10 documents not acknowledged"
        );
    }
}

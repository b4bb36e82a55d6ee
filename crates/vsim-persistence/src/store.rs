//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Asset store abstractions and storage bindings."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vsim_grid_builder::Asset;

use crate::couch::CouchStore;
use crate::file::JsonFileStore;
use crate::memory::MemoryStore;
use crate::metrics::StoreMetrics;
use crate::params::{StoreLocation, StoreParams};
use crate::{Result, StoreError};

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The asset body.
    pub doc: Asset,
}

/// Per-document result of a bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    /// Document id.
    pub id: String,
    /// Whether the document was stored.
    #[serde(default)]
    pub ok: bool,
    /// Error reported for this document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteAck {
    /// Successful acknowledgement for `id`.
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: true,
            error: None,
        }
    }

    /// Rejected acknowledgement for `id`.
    pub fn rejected(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Reads every document of the asset database.
#[async_trait]
pub trait AssetStoreReader: Send + Sync {
    /// Fetch all documents, containers included.
    async fn fetch(&self) -> Result<Vec<StoredDocument>>;
}

/// Writes asset documents in bulk, inserting or replacing by id.
#[async_trait]
pub trait AssetStoreWriter: Send + Sync {
    /// Write `assets`, returning one acknowledgement per accepted document.
    async fn bulk_write(&self, assets: &[Asset]) -> Result<Vec<WriteAck>>;
}

/// A store that can be both read and written.
pub trait AssetStore: AssetStoreReader + AssetStoreWriter {
    /// Backend label for logs and metrics.
    fn backend(&self) -> &'static str;
}

/// Open the backend selected by `params`.
pub fn open_store(params: &StoreParams) -> Result<Arc<dyn AssetStore>> {
    let location = params.resolve()?;
    info!(params = ?params, "opening asset store");
    let store: Arc<dyn AssetStore> = match location {
        StoreLocation::Memory => Arc::new(MemoryStore::new()),
        StoreLocation::File(dir) => Arc::new(JsonFileStore::new(dir, &params.database)),
        StoreLocation::Http(url) => Arc::new(CouchStore::new(url, &params.database)?),
    };
    Ok(store)
}

/// Check acknowledgements against the number of submitted documents.
pub fn verify_acks(total: usize, acks: &[WriteAck]) -> Result<()> {
    let rejected = acks.iter().filter(|ack| !ack.ok).count();
    let missing = total.saturating_sub(acks.len());
    if missing > 0 || rejected > 0 {
        return Err(StoreError::PartialWrite {
            failed: missing + rejected,
            total,
        });
    }
    Ok(())
}

/// Bulk-write `assets` and fail unless every document was acknowledged.
pub async fn write_assets(
    store: &dyn AssetStore,
    assets: &[Asset],
    metrics: Option<&StoreMetrics>,
) -> Result<Vec<WriteAck>> {
    let backend = store.backend();
    let acks = store.bulk_write(assets).await?;
    let written = acks.iter().filter(|ack| ack.ok).count();
    if let Some(metrics) = metrics {
        metrics.record_written(backend, written);
        metrics.record_rejected(backend, assets.len().saturating_sub(written));
    }
    if let Err(err) = verify_acks(assets.len(), &acks) {
        for ack in acks.iter().filter(|ack| !ack.ok) {
            warn!(backend, id = %ack.id, error = ack.error.as_deref().unwrap_or(""), "document rejected");
        }
        return Err(err);
    }
    info!(backend, documents = written, "assets written");
    Ok(acks)
}

/// Fetch every asset document.
pub async fn fetch_assets(
    store: &dyn AssetStore,
    metrics: Option<&StoreMetrics>,
) -> Result<Vec<Asset>> {
    let backend = store.backend();
    let outcome = store.fetch().await;
    if let Some(metrics) = metrics {
        metrics.record_fetch(backend, outcome.is_ok());
    }
    let docs = outcome?;
    info!(backend, documents = docs.len(), "assets fetched");
    Ok(docs.into_iter().map(|d| d.doc).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_acks_are_partial() {
        let acks = vec![WriteAck::ok("a")];
        assert!(matches!(
            verify_acks(2, &acks),
            Err(StoreError::PartialWrite { failed: 1, total: 2 })
        ));
    }

    #[test]
    fn rejected_acks_are_partial() {
        let acks = vec![WriteAck::ok("a"), WriteAck::rejected("b", "conflict")];
        assert!(matches!(
            verify_acks(2, &acks),
            Err(StoreError::PartialWrite { failed: 1, total: 2 })
        ));
        assert!(verify_acks(1, &acks[..1]).is_ok());
    }

    #[test]
    fn open_store_picks_memory_backend() {
        let store = open_store(&StoreParams::memory("assets")).unwrap();
        assert_eq!(store.backend(), "memory");
    }
}

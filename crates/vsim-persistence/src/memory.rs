//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Asset store abstractions and storage bindings."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::collections::HashSet;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use vsim_grid_builder::Asset;

use crate::store::{AssetStore, AssetStoreReader, AssetStoreWriter, StoredDocument, WriteAck};
use crate::{Result, StoreError};

#[derive(Debug, Default)]
struct Faults {
    reject: HashSet<String>,
    drop_acks: usize,
    unavailable: Option<String>,
}

/// Process-local store keeping documents in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<IndexMap<String, Asset>>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `assets`.
    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let store = Self::new();
        {
            let mut docs = store.docs.write();
            for asset in assets {
                docs.insert(asset.id.clone(), asset);
            }
        }
        store
    }

    /// Refuse documents with the given id on later writes.
    pub fn reject_id(&self, id: impl Into<String>) {
        self.faults.lock().reject.insert(id.into());
    }

    /// Omit the last `count` acknowledgements of the next write.
    pub fn drop_acks(&self, count: usize) {
        self.faults.lock().drop_acks = count;
    }

    /// Fail every request with [`StoreError::Unavailable`] until cleared with `None`.
    pub fn set_unavailable(&self, reason: Option<String>) {
        self.faults.lock().unavailable = reason;
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn check_available(&self) -> Result<()> {
        match &self.faults.lock().unavailable {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AssetStoreReader for MemoryStore {
    async fn fetch(&self) -> Result<Vec<StoredDocument>> {
        self.check_available()?;
        Ok(self
            .docs
            .read()
            .values()
            .cloned()
            .map(|doc| StoredDocument { doc })
            .collect())
    }
}

#[async_trait]
impl AssetStoreWriter for MemoryStore {
    async fn bulk_write(&self, assets: &[Asset]) -> Result<Vec<WriteAck>> {
        self.check_available()?;
        let mut faults = self.faults.lock();
        let mut docs = self.docs.write();
        let mut acks = Vec::with_capacity(assets.len());
        for asset in assets {
            if faults.reject.contains(&asset.id) {
                acks.push(WriteAck::rejected(asset.id.clone(), "forbidden"));
                continue;
            }
            docs.insert(asset.id.clone(), asset.clone());
            acks.push(WriteAck::ok(asset.id.clone()));
        }
        let keep = acks.len().saturating_sub(faults.drop_acks);
        acks.truncate(keep);
        faults.drop_acks = 0;
        Ok(acks)
    }
}

impl AssetStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsim_grid_builder::{build, Blueprint};

    fn sample() -> Vec<Asset> {
        build(&Blueprint::venue_default())
            .into_assets()
            .into_iter()
            .take(6)
            .collect()
    }

    #[tokio::test]
    async fn writes_then_fetches_in_order() {
        let store = MemoryStore::new();
        let assets = sample();
        let acks = store.bulk_write(&assets).await.unwrap();
        assert_eq!(acks.len(), 6);
        assert!(acks.iter().all(|a| a.ok));

        let fetched = store.fetch().await.unwrap();
        let ids: Vec<_> = fetched.iter().map(|d| d.doc.id.as_str()).collect();
        let expected: Vec<_> = assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn rewriting_replaces_documents() {
        let store = MemoryStore::new();
        let mut assets = sample();
        store.bulk_write(&assets).await.unwrap();
        assets[0].description = "renamed".into();
        store.bulk_write(&assets[..1]).await.unwrap();
        assert_eq!(store.len(), 6);
        assert_eq!(store.fetch().await.unwrap()[0].doc.description, "renamed");
    }

    #[tokio::test]
    async fn injected_faults_surface() {
        let store = MemoryStore::new();
        let assets = sample();
        store.reject_id(assets[1].id.clone());
        let acks = store.bulk_write(&assets).await.unwrap();
        assert!(!acks[1].ok);
        assert_eq!(acks[1].error.as_deref(), Some("forbidden"));

        store.drop_acks(2);
        assert_eq!(store.bulk_write(&assets).await.unwrap().len(), 4);
        assert_eq!(store.bulk_write(&assets).await.unwrap().len(), 6);

        store.set_unavailable(Some("maintenance".into()));
        assert!(matches!(store.fetch().await, Err(StoreError::Unavailable(_))));
    }
}

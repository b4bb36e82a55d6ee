//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Asset store abstractions and storage bindings."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::debug;
use vsim_grid_builder::Asset;

use crate::store::{AssetStore, AssetStoreReader, AssetStoreWriter, StoredDocument, WriteAck};
use crate::{Result, StoreError};

/// Current document file envelope version.
pub const ENVELOPE_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentEnvelope {
    version: u16,
    database: String,
    updated_at: DateTime<Utc>,
    hash: String,
    documents: Vec<Asset>,
}

/// Store keeping one JSON document file per database under a directory.
///
/// The file carries a SHA-256 digest of its documents; a file whose digest
/// does not match is refused on read.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    database: String,
    // serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store for `database` under `dir`.
    pub fn new(dir: impl Into<PathBuf>, database: &str) -> Self {
        let dir = dir.into();
        Self {
            path: dir.join(format!("{}.json", database)),
            database: database.to_owned(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Asset>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let envelope: DocumentEnvelope = serde_json::from_slice(&bytes)?;
        if envelope.hash != compute_hash(&envelope.documents)? {
            return Err(StoreError::HashMismatch(self.path.display().to_string()));
        }
        Ok(envelope.documents)
    }

    async fn save(&self, documents: Vec<Asset>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let envelope = DocumentEnvelope {
            version: ENVELOPE_VERSION,
            database: self.database.clone(),
            updated_at: Utc::now(),
            hash: compute_hash(&documents)?,
            documents,
        };
        let json = serde_json::to_vec_pretty(&envelope)?;
        // write-then-rename so readers never observe a torn file
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    /// Whether the file exists and passes its integrity check.
    pub async fn verify(&self) -> bool {
        self.path.exists() && self.load().await.is_ok()
    }
}

fn compute_hash(documents: &[Asset]) -> Result<String> {
    let serialized = serde_json::to_vec(documents)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized);
    Ok(hex::encode(hasher.finalize()))
}

#[async_trait]
impl AssetStoreReader for JsonFileStore {
    async fn fetch(&self) -> Result<Vec<StoredDocument>> {
        let _guard = self.lock.lock().await;
        let docs = self.load().await?;
        Ok(docs.into_iter().map(|doc| StoredDocument { doc }).collect())
    }
}

#[async_trait]
impl AssetStoreWriter for JsonFileStore {
    async fn bulk_write(&self, assets: &[Asset]) -> Result<Vec<WriteAck>> {
        let _guard = self.lock.lock().await;
        let mut merged: IndexMap<String, Asset> = self
            .load()
            .await?
            .into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect();
        for asset in assets {
            merged.insert(asset.id.clone(), asset.clone());
        }
        self.save(merged.into_values().collect())
            .await
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?;
        debug!(path = %self.path.display(), documents = assets.len(), "document file updated");
        Ok(assets.iter().map(|a| WriteAck::ok(a.id.clone())).collect())
    }
}

impl AssetStore for JsonFileStore {
    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vsim_grid_builder::{build, Blueprint};

    #[tokio::test]
    async fn write_and_fetch_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), "assets");
        let assets = build(&Blueprint::venue_default()).into_assets();

        let acks = store.bulk_write(&assets).await.unwrap();
        assert_eq!(acks.len(), assets.len());
        assert!(store.verify().await);

        let fetched: Vec<Asset> = store.fetch().await.unwrap().into_iter().map(|d| d.doc).collect();
        assert_eq!(fetched, assets);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"), "assets");
        assert!(store.fetch().await.unwrap().is_empty());
        assert!(!store.verify().await);
    }

    #[tokio::test]
    async fn rejects_tampered_file() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path(), "assets");
        let assets: Vec<Asset> = build(&Blueprint::venue_default())
            .into_assets()
            .into_iter()
            .take(5)
            .collect();
        store.bulk_write(&assets).await.unwrap();

        let mut envelope: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        envelope["documents"][4]["settings"]["coef"] = serde_json::json!(0.99);
        std::fs::write(store.path(), serde_json::to_vec(&envelope).unwrap()).unwrap();

        assert!(!store.verify().await);
        assert!(matches!(store.fetch().await, Err(StoreError::HashMismatch(_))));
    }
}

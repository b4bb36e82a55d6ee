//! ---
//! vsim_section: "03-persistence-logging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Asset store abstractions and storage bindings."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
//! CouchDB-compatible HTTP store (`_all_docs`, `_bulk_docs`).

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;
use vsim_grid_builder::Asset;

use crate::store::{AssetStore, AssetStoreReader, AssetStoreWriter, StoredDocument, WriteAck};
use crate::{Result, StoreError};

#[derive(Debug, Deserialize)]
struct AllDocs {
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<RowValue>,
    #[serde(default)]
    doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RowValue {
    rev: String,
}

#[derive(Debug, Deserialize)]
struct BulkResult {
    #[serde(default)]
    id: String,
    #[serde(default)]
    ok: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Asset store backed by a CouchDB-compatible server.
#[derive(Debug, Clone)]
pub struct CouchStore {
    client: Client,
    base: Url,
    database: String,
    auth: Option<(String, String)>,
}

impl CouchStore {
    /// Store for `database` at `url`. Credentials embedded in the URL are sent as basic auth.
    pub fn new(url: Url, database: &str) -> Result<Self> {
        let mut base = url;
        let auth = if base.username().is_empty() {
            None
        } else {
            let user = decode(base.username());
            let pass = decode(base.password().unwrap_or(""));
            let _ = base.set_username("");
            let _ = base.set_password(None);
            Some((user, pass))
        };
        let client = Client::builder()
            .user_agent(concat!("vsim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base,
            database: database.to_owned(),
            auth,
        })
    }

    fn endpoint(&self, suffix: &str) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Unavailable(format!("{} cannot be a base", self.base)))?;
            segments.pop_if_empty().push(&self.database);
            for part in suffix.split('/').filter(|p| !p.is_empty()) {
                segments.push(part);
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn check(response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Unavailable(format!(
            "{} returned {}: {}",
            context,
            status,
            body.trim()
        )))
    }

    /// Create the database if it does not exist yet.
    pub async fn ensure_database(&self) -> Result<()> {
        let url = self.endpoint("")?;
        let response = self.authorize(self.client.put(url)).send().await?;
        match response.status() {
            StatusCode::PRECONDITION_FAILED => Ok(()),
            _ => Self::check(response, "create database").await.map(|_| ()),
        }
    }

    async fn current_revisions(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let url = self.endpoint("_all_docs")?;
        let response = self
            .authorize(self.client.post(url))
            .json(&json!({ "keys": ids }))
            .send()
            .await?;
        let rows: AllDocs = Self::check(response, "_all_docs").await?.json().await?;
        Ok(rows
            .rows
            .into_iter()
            .filter_map(|row| Some((row.id?, row.value?.rev)))
            .collect())
    }
}

/// Percent-decode URL userinfo. `+` stays literal.
fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

#[async_trait]
impl AssetStoreReader for CouchStore {
    async fn fetch(&self) -> Result<Vec<StoredDocument>> {
        let mut url = self.endpoint("_all_docs")?;
        url.query_pairs_mut().append_pair("include_docs", "true");
        let response = self.authorize(self.client.get(url)).send().await?;
        let all: AllDocs = Self::check(response, "_all_docs").await?.json().await?;

        let mut docs = Vec::with_capacity(all.rows.len());
        for row in all.rows {
            if row.id.as_deref().is_some_and(|id| id.starts_with("_design/")) {
                continue;
            }
            if let Some(doc) = row.doc {
                docs.push(StoredDocument {
                    doc: serde_json::from_value(doc)?,
                });
            }
        }
        debug!(database = %self.database, documents = docs.len(), "couch documents fetched");
        Ok(docs)
    }
}

#[async_trait]
impl AssetStoreWriter for CouchStore {
    async fn bulk_write(&self, assets: &[Asset]) -> Result<Vec<WriteAck>> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_database().await?;
        let ids: Vec<String> = assets.iter().map(|a| a.id.clone()).collect();
        let revisions = self.current_revisions(&ids).await?;

        let mut docs = Vec::with_capacity(assets.len());
        for asset in assets {
            let mut doc = serde_json::to_value(asset)?;
            if let Some(object) = doc.as_object_mut() {
                object.insert("_id".into(), Value::String(asset.id.clone()));
                if let Some(rev) = revisions.get(&asset.id) {
                    object.insert("_rev".into(), Value::String(rev.clone()));
                }
            }
            docs.push(doc);
        }

        let url = self.endpoint("_bulk_docs")?;
        let response = self
            .authorize(self.client.post(url))
            .json(&json!({ "docs": docs }))
            .send()
            .await
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?;
        let response = Self::check(response, "_bulk_docs")
            .await
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?;
        let results: Vec<BulkResult> = response.json().await?;

        let acks: Vec<WriteAck> = results
            .into_iter()
            .map(|r| match (r.ok, r.error) {
                (Some(true), _) => WriteAck::ok(r.id),
                (_, Some(error)) => {
                    let reason = r.reason.unwrap_or_default();
                    WriteAck::rejected(r.id, format!("{}: {}", error, reason))
                }
                (_, None) => WriteAck::rejected(r.id, "not acknowledged"),
            })
            .collect();
        info!(
            database = %self.database,
            submitted = assets.len(),
            updated = revisions.len(),
            "bulk write answered"
        );
        Ok(acks)
    }
}

impl AssetStore for CouchStore {
    fn backend(&self) -> &'static str {
        "couchdb"
    }
}

//! Pinecone HTTP Client
//!
//! Direct reqwest client for Pinecone's REST API. Index management goes to
//! the control plane; vector reads and writes go to the index's own
//! data-plane host, discovered once and cached.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{IndexSpec, QueryMatch, VectorIndex, VectorRecord, VectorStoreError};

pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const API_VERSION: &str = "2024-07";

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

/// Pinecone client bound to one index
pub struct PineconeClient {
    http: Client,
    controller_url: String,
    api_key: String,
    index_name: String,
    /// Data-plane base URL, filled on first use
    host: RwLock<Option<String>>,
}

impl PineconeClient {
    pub fn new(api_key: &str, index_name: &str, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            controller_url: DEFAULT_CONTROLLER_URL.to_string(),
            api_key: api_key.trim().to_string(),
            index_name: index_name.to_string(),
            host: RwLock::new(None),
        }
    }

    pub fn with_controller_url(mut self, url: &str) -> Self {
        self.controller_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Skip host discovery and talk to a known data-plane host.
    pub fn with_host(self, host: &str) -> Self {
        *self.host.write() = Some(normalize_host(host));
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    /// Resolve the data-plane URL for the bound index.
    async fn data_plane(&self) -> Result<String, VectorStoreError> {
        let cached = self.host.read().clone();
        if let Some(host) = cached {
            return Ok(host);
        }

        debug!(index = %self.index_name, "Describing index for host discovery");
        let resp = self
            .authed(self.http.get(format!("{}/indexes/{}", self.controller_url, self.index_name)))
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(VectorStoreError::IndexNotFound(self.index_name.clone()));
        }
        let resp = check_status(resp, "Describe index").await?;
        let text = resp.text().await?;
        let description: IndexDescription = serde_json::from_str(&text)
            .map_err(|e| VectorStoreError::Deserialize(format!("{}: {}", e, text)))?;

        if let Some(status) = &description.status {
            if !status.ready {
                return Err(VectorStoreError::IndexNotReady(format!(
                    "{} ({})",
                    description.name, status.state
                )));
            }
        }

        let host = description
            .host
            .filter(|h| !h.is_empty())
            .map(|h| normalize_host(&h))
            .ok_or_else(|| VectorStoreError::IndexNotReady(format!("{} has no host yet", description.name)))?;

        info!(index = %self.index_name, host = %host, "Resolved index host");
        *self.host.write() = Some(host.clone());
        Ok(host)
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        let resp = self
            .authed(self.http.get(format!("{}/indexes", self.controller_url)))
            .send()
            .await?;
        let resp = check_status(resp, "List indexes").await?;

        let list: IndexList = resp.json().await.map_err(|e| VectorStoreError::Deserialize(e.to_string()))?;
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        let resp = self
            .authed(self.http.post(format!("{}/indexes", self.controller_url)))
            .json(&create_index_body(spec))
            .send()
            .await?;

        if resp.status() == StatusCode::CONFLICT {
            warn!(name = %spec.name, "Index already exists (409)");
            return Ok(());
        }
        check_status(resp, "Create index").await?;

        info!(name = %spec.name, dimension = spec.dimension, metric = %spec.metric, "Created index");
        Ok(())
    }

    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, VectorStoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let host = self.data_plane().await?;
        let resp = self
            .authed(self.http.post(format!("{}/vectors/upsert", host)))
            .json(&upsert_body(namespace, records))
            .send()
            .await?;
        let resp = check_status(resp, "Upsert").await?;

        let parsed: UpsertResponse = resp.json().await.map_err(|e| VectorStoreError::Deserialize(e.to_string()))?;
        let count = parsed.upserted_count.unwrap_or(records.len());
        info!(namespace = %namespace, count = count, "Upserted vectors");
        Ok(count)
    }

    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, VectorStoreError> {
        let host = self.data_plane().await?;
        debug!(namespace = %namespace, top_k = top_k, "Querying index");
        let resp = self
            .authed(self.http.post(format!("{}/query", host)))
            .json(&query_body(namespace, vector, top_k))
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            warn!(namespace = %namespace, "Namespace not found (404), returning no matches");
            return Ok(Vec::new());
        }
        let resp = check_status(resp, "Query").await?;

        let parsed: QueryResponse = resp.json().await.map_err(|e| VectorStoreError::Deserialize(e.to_string()))?;
        Ok(parsed.matches)
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), VectorStoreError> {
        let host = self.data_plane().await?;
        let resp = self
            .authed(self.http.post(format!("{}/vectors/delete", host)))
            .json(&json!({ "deleteAll": true, "namespace": namespace }))
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            warn!(namespace = %namespace, "Namespace already deleted (404)");
            return Ok(());
        }
        check_status(resp, "Delete").await?;

        info!(namespace = %namespace, "Deleted namespace");
        Ok(())
    }
}

/// Pass successful responses through; turn the rest into errors.
async fn check_status(resp: Response, operation: &str) -> Result<Response, VectorStoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    error!(operation = %operation, status = %status, body = %body, "Pinecone HTTP error");
    Err(classify_failure(status, body))
}

pub fn classify_failure(status: StatusCode, body: String) -> VectorStoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => VectorStoreError::Unauthorized,
        _ => VectorStoreError::Http { status: status.as_u16(), body },
    }
}

/// Hosts come back bare from the control plane.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn create_index_body(spec: &IndexSpec) -> Value {
    json!({
        "name": spec.name,
        "dimension": spec.dimension,
        "metric": spec.metric,
        "spec": {
            "serverless": {
                "cloud": spec.cloud,
                "region": spec.region,
            }
        }
    })
}

fn upsert_body(namespace: &str, records: &[VectorRecord]) -> Value {
    json!({
        "vectors": records,
        "namespace": namespace,
    })
}

fn query_body(namespace: &str, vector: &[f32], top_k: usize) -> Value {
    json!({
        "namespace": namespace,
        "vector": vector,
        "topK": top_k,
        "includeMetadata": true,
        "includeValues": false,
    })
}

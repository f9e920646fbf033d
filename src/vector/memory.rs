//! In-Memory Vector Index
//!
//! Brute-force cosine search over records held in process memory. Useful
//! offline and as a stand-in for the hosted index.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{IndexSpec, QueryMatch, VectorIndex, VectorRecord, VectorStoreError};
use crate::documents::embeddings::cosine_similarity;

#[derive(Default)]
struct MemoryState {
    indexes: BTreeSet<String>,
    /// Namespace to id to record
    namespaces: HashMap<String, BTreeMap<String, VectorRecord>>,
}

/// Thread-safe in-memory index with a fixed dimension
pub struct MemoryIndex {
    dimension: usize,
    state: RwLock<MemoryState>,
}

impl MemoryIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Start with a named index already present.
    pub fn with_index(self, name: &str) -> Self {
        self.state.write().indexes.insert(name.to_string());
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of records stored in a namespace
    pub fn record_count(&self, namespace: &str) -> usize {
        self.state.read().namespaces.get(namespace).map_or(0, |records| records.len())
    }

    pub fn get(&self, namespace: &str, id: &str) -> Option<VectorRecord> {
        self.state.read().namespaces.get(namespace)?.get(id).cloned()
    }

    fn check_dimension(&self, actual: usize) -> Result<(), VectorStoreError> {
        if actual != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        Ok(self.state.read().indexes.iter().cloned().collect())
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<(), VectorStoreError> {
        self.check_dimension(spec.dimension)?;
        self.state.write().indexes.insert(spec.name.clone());
        Ok(())
    }

    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<usize, VectorStoreError> {
        for record in records {
            self.check_dimension(record.values.len())?;
        }

        let mut state = self.state.write();
        let entries = state.namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            entries.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, VectorStoreError> {
        self.check_dimension(vector.len())?;

        let state = self.state.read();
        let Some(records) = state.namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<QueryMatch> = records
            .values()
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.values),
                metadata: Some(record.metadata.clone()),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_all(&self, namespace: &str) -> Result<(), VectorStoreError> {
        self.state.write().namespaces.remove(namespace);
        Ok(())
    }
}

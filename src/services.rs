//! Application Services
//!
//! The long-lived clients built once at startup and shared by every request.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::documents::{Assistant, EmbeddingClient};
use crate::inference::{FeatureExtractor, HuggingFaceClient, TextGenerator};
use crate::vector::{IndexSpec, PineconeClient, StoreSettings, VectorIndex, VectorStore};

pub struct Services {
    pub store: VectorStore,
    pub assistant: Assistant,
    pub max_upload_bytes: usize,
}

impl Services {
    /// Wire providers into the pipeline.
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        generator: Arc<dyn TextGenerator>,
        index: Arc<dyn VectorIndex>,
        store_settings: StoreSettings,
        max_upload_bytes: usize,
    ) -> Self {
        let store = VectorStore::new(index, EmbeddingClient::new(extractor), store_settings);
        let assistant = Assistant::new(store.clone(), generator);
        Self {
            store,
            assistant,
            max_upload_bytes,
        }
    }

    /// Hosted providers configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let hf = Arc::new(HuggingFaceClient::new(
            &settings.huggingface_api_key,
            &settings.embedding_model,
            &settings.generation_model,
            Duration::from_secs(settings.hf_timeout_secs),
        ));

        let mut pinecone = PineconeClient::new(
            &settings.pinecone_api_key,
            &settings.pinecone_index_name,
            Duration::from_secs(settings.pinecone_timeout_secs),
        );
        if let Some(host) = settings.pinecone_index_host.as_deref().filter(|h| !h.trim().is_empty()) {
            pinecone = pinecone.with_host(host);
        }

        let mut index = IndexSpec::new(&settings.pinecone_index_name);
        index.cloud = settings.pinecone_cloud.clone();
        index.region = settings.pinecone_region.clone();

        info!(
            index = %settings.pinecone_index_name,
            embedding_model = %settings.embedding_model,
            generation_model = %hf.generation_model(),
            "Services configured"
        );

        Self::new(
            hf.clone(),
            hf,
            Arc::new(pinecone),
            StoreSettings::new(index),
            settings.max_file_size,
        )
    }
}

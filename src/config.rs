//! Runtime configuration shared by the server and the CLI.

use clap::Args;

use crate::documents::ingest::DEFAULT_MAX_UPLOAD_BYTES;
use crate::inference::client::{DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL};
use crate::vector::{DEFAULT_CLOUD, DEFAULT_REGION};

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Hugging Face token used for embeddings and generation.
    #[arg(long, env = "HUGGINGFACE_API_KEY", hide_env_values = true)]
    pub huggingface_api_key: String,

    /// Pinecone API key.
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pub pinecone_api_key: String,

    /// Name of the Pinecone index holding document chunks.
    #[arg(long, env = "PINECONE_INDEX_NAME", default_value = "pdf-chat")]
    pub pinecone_index_name: String,

    /// Data-plane host of the index; discovered from the control plane when unset.
    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pub pinecone_index_host: Option<String>,

    /// Serverless cloud for a newly created index.
    #[arg(long, env = "PINECONE_CLOUD", default_value = DEFAULT_CLOUD)]
    pub pinecone_cloud: String,

    /// Serverless region for a newly created index.
    #[arg(long, env = "PINECONE_REGION", default_value = DEFAULT_REGION)]
    pub pinecone_region: String,

    /// Feature-extraction model producing 384-dimensional embeddings.
    #[arg(long, env = "HF_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Chat model used to answer questions.
    #[arg(long, env = "HF_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    pub generation_model: String,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_file_size: usize,

    /// Seconds before Hugging Face requests time out.
    #[arg(long, env = "HF_TIMEOUT_SECS", default_value_t = 120)]
    pub hf_timeout_secs: u64,

    /// Seconds before Pinecone requests time out.
    #[arg(long, env = "PINECONE_TIMEOUT_SECS", default_value_t = 30)]
    pub pinecone_timeout_secs: u64,
}

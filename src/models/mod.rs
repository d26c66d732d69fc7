mod config;
mod document;
mod message;
mod search;

pub use config::{
    ChatConfig, Config, DEFAULT_EMBEDDING_MODEL, DEFAULT_PREM_BASE_URL, DEFAULT_QDRANT_URL,
    DEFAULT_STAGING_DIR, DatabaseConfig, EmbeddingConfig, OutputConfig, PremConfig, QdrantConfig,
    RepositoryConfig, ResolvedConfig, SummarizerConfig,
};
pub use document::{Document, DocumentChunk, DocumentMetadata, RetrievedPaper, pair_papers};
pub use message::{ChatMessage, ChatSession, Role};
pub use search::OutputFormat;

//! Error types for the premchat CLI.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to the hosted LLM and embedding API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to connect to Prem API: {0}")]
    ConnectionError(String),

    #[error("Prem API error: status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Prem API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid Prem API response: {0}")]
    InvalidResponse(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Prem API timeout")]
    Timeout,
}

impl Retryable for LlmError {
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::ConnectionError(_) | LlmError::Timeout => true,
            LlmError::ServerError { status, .. } => {
                *status == 429 || (500..600).contains(status)
            }
            LlmError::RequestError(e) => e.is_timeout() || e.is_connect(),
            LlmError::InvalidResponse(_) | LlmError::MissingCredentials(_) => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to Qdrant: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] LlmError),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) => true,
            VectorStoreError::CollectionError(msg) | VectorStoreError::SearchError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
            VectorStoreError::EmbeddingError(e) => e.is_retryable(),
        }
    }
}

/// Errors along the retrieve-then-generate path of the paper Q&A.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] VectorStoreError),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

/// Errors related to the hosted document repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("file too large: {name} ({size} > {max} bytes)")]
    FileTooLarge { name: String, size: u64, max: u64 },

    #[error("upload failed: {0}")]
    UploadError(#[from] LlmError),
}

/// Errors related to the relational database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("no tables found")]
    NoTables,

    #[error("model did not produce a usable SQL query: {0}")]
    InvalidSql(String),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),
}

/// Errors related to loading web pages.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("fetch failed: {0}")]
    FetchError(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

/// Errors related to map-reduce summarization.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("loader error: {0}")]
    LoaderError(#[from] LoaderError),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),

    #[error("a single summary of ~{tokens} tokens exceeds token_max {token_max}")]
    DocumentTooLarge { tokens: usize, token_max: usize },

    #[error("summaries still exceed token_max after {0} collapse rounds")]
    CollapseLimit(u32),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("RAG error: {0}")]
    Rag(#[from] RagError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("summarize error: {0}")]
    Summarize(#[from] SummarizeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_retryable() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::ConnectionError("refused".into()).is_retryable());
        assert!(!LlmError::InvalidResponse("bad json".into()).is_retryable());
    }

    fn server_error(status: u16, body: &str) -> LlmError {
        LlmError::ServerError {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_server_error_retryable_by_status() {
        assert!(server_error(500, "oops").is_retryable());
        assert!(server_error(503, "Service Unavailable").is_retryable());
        assert!(server_error(429, "slow down").is_retryable());
        assert!(!server_error(401, "Unauthorized").is_retryable());
        assert!(!server_error(400, "token 4291 invalid, retry after 503ms").is_retryable());
        assert!(!LlmError::InvalidResponse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_vector_store_error_retryable() {
        assert!(VectorStoreError::ConnectionError("x".into()).is_retryable());
        assert!(VectorStoreError::SearchError("connection reset".into()).is_retryable());
        assert!(!VectorStoreError::CollectionError("not found".into()).is_retryable());
    }
}

//! Vector store abstraction layer.
//!
//! The arXiv app only reads from Qdrant: it lists collections and runs
//! nearest-neighbour searches, pulling one payload field out of each hit.

mod qdrant;

pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;

/// One search hit reduced to a single payload field.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredText {
    pub score: f32,
    pub text: String,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError>;

    /// Search `collection` and return the string value of `field` for each hit.
    ///
    /// Hits whose payload lacks the field are skipped.
    async fn search_field(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        field: &str,
    ) -> Result<Vec<ScoredText>, VectorStoreError>;
}

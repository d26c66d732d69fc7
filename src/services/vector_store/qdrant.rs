//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{SearchPointsBuilder, Value};

use super::{ScoredText, VectorStore};
use crate::error::VectorStoreError;
use crate::models::QdrantConfig;
use crate::utils::retry::{RetryConfig, with_retry};

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    url: String,
    retry: RetryConfig,
}

impl QdrantBackend {
    pub fn new(config: &QdrantConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            retry: RetryConfig::default(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Render a payload value as text; lists are joined with ", ".
fn value_to_text(value: &Value) -> Option<String> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        Kind::IntegerValue(n) => Some(n.to_string()),
        Kind::DoubleValue(n) => Some(n.to_string()),
        Kind::BoolValue(b) => Some(b.to_string()),
        Kind::ListValue(list) => {
            let parts: Vec<String> = list.values.iter().filter_map(value_to_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Kind::NullValue(_) | Kind::StructValue(_) => None,
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError> {
        let response = with_retry(&self.retry, || async {
            self.client
                .list_collections()
                .await
                .map_err(|e| VectorStoreError::CollectionError(e.to_string()))
        })
        .await
        .into_result()?;

        let mut names: Vec<String> = response.collections.into_iter().map(|c| c.name).collect();
        names.sort();
        Ok(names)
    }

    async fn search_field(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
        field: &str,
    ) -> Result<Vec<ScoredText>, VectorStoreError> {
        let results = with_retry(&self.retry, || async {
            let search = SearchPointsBuilder::new(collection, query_vector.clone(), limit)
                .with_payload(true);
            self.client
                .search_points(search)
                .await
                .map_err(|e| VectorStoreError::SearchError(e.to_string()))
        })
        .await
        .into_result()?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                let text = point.payload.get(field).and_then(value_to_text)?;
                Some(ScoredText {
                    score: point.score,
                    text,
                })
            })
            .collect())
    }
}

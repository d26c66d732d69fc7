//! In-memory fakes for the service traits, shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::llm::{
    ChatModel, ChatRequest, Completion, DocumentRepository, Embedder, UploadedDocument,
};
use super::vector_store::{ScoredText, VectorStore};
use crate::error::{LlmError, VectorStoreError};
use crate::models::DocumentChunk;

type Handler = Arc<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

/// Chat model whose reply is computed from the last user message.
#[derive(Clone)]
pub struct FakeModel {
    handler: Handler,
    chunks: Vec<DocumentChunk>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl FakeModel {
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            chunks: Vec::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::with_handler(move |_| Ok(reply.clone()))
    }

    pub fn failing() -> Self {
        Self::with_handler(|_| {
            Err(LlmError::ServerError {
                status: 500,
                body: "boom".to_string(),
            })
        })
    }

    pub fn with_chunks(mut self, chunks: Vec<DocumentChunk>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Content of the last message of every request, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn chat(&self, request: ChatRequest) -> Result<Completion, LlmError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.requests.lock().unwrap().push(request);

        let content = (self.handler)(&prompt)?;
        Ok(Completion {
            content,
            document_chunks: self.chunks.clone(),
        })
    }
}

#[derive(Default)]
pub struct FakeEmbedder;

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0, 0.0]).collect())
    }
}

/// Vector store returning canned payload values per field.
#[derive(Default)]
pub struct FakeStore {
    fields: HashMap<String, Vec<String>>,
    collections: Vec<String>,
    unreachable: bool,
}

impl FakeStore {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: &str, values: &[&str]) -> Self {
        self.fields.insert(
            field.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn with_collections(mut self, names: &[&str]) -> Self {
        self.collections = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(!self.unreachable)
    }

    async fn list_collections(&self) -> Result<Vec<String>, VectorStoreError> {
        if self.unreachable {
            return Err(VectorStoreError::ConnectionError("refused".to_string()));
        }
        Ok(self.collections.clone())
    }

    async fn search_field(
        &self,
        _collection: &str,
        _query_vector: Vec<f32>,
        limit: u64,
        field: &str,
    ) -> Result<Vec<ScoredText>, VectorStoreError> {
        if self.unreachable {
            return Err(VectorStoreError::ConnectionError("refused".to_string()));
        }
        Ok(self
            .fields
            .get(field)
            .map(|values| {
                values
                    .iter()
                    .take(limit as usize)
                    .enumerate()
                    .map(|(i, text)| ScoredText {
                        score: 1.0 - i as f32 * 0.1,
                        text: text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Repository that records uploads; names containing `fail_marker` fail.
#[derive(Default, Clone)]
pub struct FakeRepository {
    pub fail_marker: Option<String>,
    uploads: Arc<Mutex<Vec<(u64, String, String)>>>,
}

impl FakeRepository {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Default::default()
        }
    }

    /// `(repository_id, name, content)` of every successful upload.
    pub fn uploads(&self) -> Vec<(u64, String, String)> {
        self.uploads.lock().unwrap().clone()
    }

    fn record(&self, repository_id: u64, name: &str, content: String) -> Result<UploadedDocument, LlmError> {
        if self
            .fail_marker
            .as_deref()
            .is_some_and(|marker| name.contains(marker))
        {
            return Err(LlmError::ServerError {
                status: 413,
                body: "too large".to_string(),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((repository_id, name.to_string(), content));
        Ok(UploadedDocument {
            id: Some(uploads.len() as u64),
            name: Some(name.to_string()),
            status: Some("PENDING".to_string()),
        })
    }
}

#[async_trait]
impl DocumentRepository for FakeRepository {
    async fn upload_file(
        &self,
        repository_id: u64,
        path: &Path,
    ) -> Result<UploadedDocument, LlmError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path).unwrap_or_default();
        self.record(repository_id, &name, content)
    }

    async fn upload_text(
        &self,
        repository_id: u64,
        name: &str,
        content: &str,
    ) -> Result<UploadedDocument, LlmError> {
        self.record(repository_id, name, content.to_string())
    }
}

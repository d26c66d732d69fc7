//! Seams between the apps and the hosted model services.
//!
//! The Prem client implements all three traits; tests swap in fakes.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::models::{ChatMessage, DocumentChunk};

/// Repository-grounded retrieval parameters sent with a completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryQuery {
    pub ids: Vec<u64>,
    pub similarity_threshold: f32,
    pub limit: u32,
}

/// A chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub repositories: Option<RepositoryQuery>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            repositories: None,
        }
    }

    pub fn with_repositories(mut self, repositories: RepositoryQuery) -> Self {
        self.repositories = Some(repositories);
        self
    }
}

/// The assistant reply plus any repository chunks used to ground it.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub content: String,
    pub document_chunks: Vec<DocumentChunk>,
}

/// A document stored in a hosted repository.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadedDocument {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<Completion, LlmError>;

    /// Single-turn convenience used by prompt-driven chains.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let completion = self
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;
        Ok(completion.content)
    }
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("empty embedding response".to_string()))
    }
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn upload_file(
        &self,
        repository_id: u64,
        path: &Path,
    ) -> Result<UploadedDocument, LlmError>;

    async fn upload_text(
        &self,
        repository_id: u64,
        name: &str,
        content: &str,
    ) -> Result<UploadedDocument, LlmError>;
}

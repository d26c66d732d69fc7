//! Client for the Prem REST API: completions, embeddings and repository documents.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::llm::{
    ChatModel, ChatRequest, Completion, DocumentRepository, Embedder, RepositoryQuery,
    UploadedDocument,
};
use crate::error::LlmError;
use crate::models::{ChatMessage, Config, DocumentChunk, Role};
use crate::utils::retry::{RetryConfig, with_retry};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    project_id: u64,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repositories: Option<&'a RepositoryQuery>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    document_chunks: Vec<DocumentChunk>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    project_id: u64,
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for the Prem API.
#[derive(Debug, Clone)]
pub struct PremClient {
    client: Client,
    base_url: String,
    api_key: String,
    project_id: u64,
    temperature: f32,
    max_tokens: u32,
    embedding_model: String,
    retry: RetryConfig,
}

impl PremClient {
    /// Build a client; fails when the API key or project id is missing.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let api_key = config.prem.api_key.clone().ok_or_else(|| {
            LlmError::MissingCredentials(
                "set PREMAI_API_KEY or prem.api_key in config.toml".to_string(),
            )
        })?;
        let project_id = config.prem.project_id.ok_or_else(|| {
            LlmError::MissingCredentials(
                "set PREMAI_PROJECT_ID or prem.project_id in config.toml".to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.prem.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.prem.base_url.trim_end_matches('/').to_string(),
            api_key,
            project_id,
            temperature: config.prem.temperature,
            max_tokens: config.prem.max_tokens,
            embedding_model: config.embedding.model.clone(),
            retry: RetryConfig::new(config.prem.max_retries),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    /// Check that the API is reachable and the key is accepted.
    pub async fn health_check(&self) -> Result<bool, LlmError> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();

        with_retry(&self.retry, || async {
            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await
                .map_err(map_send_error)?;
            parse_response(response).await
        })
        .await
        .into_result()
    }

    async fn post_document(
        &self,
        repository_id: u64,
        name: &str,
        bytes: Vec<u8>,
        document_type: &'static str,
    ) -> Result<UploadedDocument, LlmError> {
        let url = format!("{}/v1/repositories/{}/document", self.base_url, repository_id);
        let url = url.as_str();
        let bytes = bytes.as_slice();

        with_retry(&self.retry, || async {
            let part = Part::bytes(bytes.to_vec()).file_name(name.to_string());
            let form = Form::new()
                .text("name", name.to_string())
                .text("document_type", document_type)
                .part("file", part);

            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(map_send_error)?;
            parse_response(response).await
        })
        .await
        .into_result()
    }
}

fn map_send_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else if e.is_connect() {
        LlmError::ConnectionError(e.to_string())
    } else {
        LlmError::RequestError(e)
    }
}

async fn parse_response<R: DeserializeOwned>(response: Response) -> Result<R, LlmError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::ServerError { status, body });
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))
}

/// The Prem API takes the system prompt as a separate field.
fn split_system_prompt(messages: &[ChatMessage]) -> (Option<&str>, &[ChatMessage]) {
    match messages.split_first() {
        Some((first, rest)) if first.role == Role::System => (Some(first.content.as_str()), rest),
        _ => (None, messages),
    }
}

#[async_trait]
impl ChatModel for PremClient {
    async fn chat(&self, request: ChatRequest) -> Result<Completion, LlmError> {
        let (system_prompt, messages) = split_system_prompt(&request.messages);
        let body = CompletionRequest {
            project_id: self.project_id,
            messages,
            system_prompt,
            repositories: request.repositories.as_ref(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        tracing::debug!(
            messages = messages.len(),
            grounded = body.repositories.is_some(),
            "requesting chat completion"
        );

        let response: CompletionResponse = self.post_json("/v1/chat/completions", &body).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("completion has no content".to_string()))?;

        Ok(Completion {
            content,
            document_chunks: response.document_chunks,
        })
    }
}

#[async_trait]
impl Embedder for PremClient {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            project_id: self.project_id,
            model: &self.embedding_model,
            input: &texts,
        };
        let mut response: EmbeddingResponse = self.post_json("/v1/embeddings", &body).await?;

        if response.data.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl DocumentRepository for PremClient {
    async fn upload_file(
        &self,
        repository_id: u64,
        path: &Path,
    ) -> Result<UploadedDocument, LlmError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("{}: {e}", path.display())))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let document_type = if crate::utils::is_pdf(path) { "pdf" } else { "text" };

        self.post_document(repository_id, &name, bytes, document_type)
            .await
    }

    async fn upload_text(
        &self,
        repository_id: u64,
        name: &str,
        content: &str,
    ) -> Result<UploadedDocument, LlmError> {
        self.post_document(repository_id, name, content.as_bytes().to_vec(), "text")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_credentials() -> Config {
        let mut config = Config::default();
        config.prem.api_key = Some("sk-test".to_string());
        config.prem.project_id = Some(4071);
        config
    }

    #[test]
    fn test_client_requires_credentials() {
        let err = PremClient::new(&Config::default()).unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials(_)));

        let mut config = Config::default();
        config.prem.api_key = Some("sk-test".to_string());
        assert!(matches!(
            PremClient::new(&config),
            Err(LlmError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_base_url_trimming() {
        let mut config = config_with_credentials();
        config.prem.base_url = "https://app.premai.io/".to_string();
        let client = PremClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://app.premai.io");
        assert_eq!(client.project_id(), 4071);
    }

    #[test]
    fn test_split_system_prompt() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hello"),
        ];
        let (system, rest) = split_system_prompt(&messages);
        assert_eq!(system, Some("be brief"));
        assert_eq!(rest.len(), 1);

        let messages = vec![ChatMessage::user("hello")];
        let (system, rest) = split_system_prompt(&messages);
        assert!(system.is_none());
        assert_eq!(rest.len(), 1);
    }

    #[test]
    fn test_completion_request_shape() {
        let messages = vec![ChatMessage::user("what is in the pdf?")];
        let repositories = RepositoryQuery {
            ids: vec![2100],
            similarity_threshold: 0.25,
            limit: 5,
        };
        let body = CompletionRequest {
            project_id: 4071,
            messages: &messages,
            system_prompt: None,
            repositories: Some(&repositories),
            temperature: 0.1,
            max_tokens: 1024,
            stream: false,
        };
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["project_id"], 4071);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["repositories"]["ids"][0], 2100);
        assert_eq!(value["repositories"]["limit"], 5);
        assert_eq!(value["stream"], false);
        assert!(value.get("system_prompt").is_none());
    }

    #[test]
    fn test_completion_response_parsing() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "It covers transformers."}}],
            "document_chunks": [{"document_name": "attention.pdf", "similarity_score": 0.81, "content": "..."}]
        }"#;
        let response: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("It covers transformers.")
        );
        assert_eq!(response.document_chunks.len(), 1);
    }
}

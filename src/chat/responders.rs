use std::sync::Arc;

use async_trait::async_trait;

use super::{ChatReply, ContextPanel, Responder};
use crate::error::AppError;
use crate::models::ChatMessage;
use crate::services::{ChatModel, ChatRequest, NlSqlQueryEngine, RagPipeline, RepositoryQuery};

/// Answers from paper abstracts stored in Qdrant.
pub struct ArxivResponder {
    pipeline: RagPipeline,
}

impl ArxivResponder {
    pub fn new(pipeline: RagPipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Responder for ArxivResponder {
    async fn respond(&self, prompt: &str) -> Result<ChatReply, AppError> {
        let prediction = self.pipeline.forward(prompt).await?;
        let papers = prediction.papers();
        Ok(ChatReply::new(prediction.answer, ContextPanel::Papers(papers)))
    }
}

/// Answers grounded on documents uploaded to a Prem repository.
pub struct PdfResponder {
    model: Arc<dyn ChatModel>,
    repositories: RepositoryQuery,
}

impl PdfResponder {
    pub fn new(model: Arc<dyn ChatModel>, repositories: RepositoryQuery) -> Self {
        Self {
            model,
            repositories,
        }
    }
}

#[async_trait]
impl Responder for PdfResponder {
    async fn respond(&self, prompt: &str) -> Result<ChatReply, AppError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_repositories(self.repositories.clone());
        let completion = self.model.chat(request).await?;
        Ok(ChatReply::new(
            completion.content,
            ContextPanel::Chunks(completion.document_chunks),
        ))
    }
}

/// Answers computed from SQL run against the selected tables.
pub struct SqlResponder {
    engine: NlSqlQueryEngine,
}

impl SqlResponder {
    pub fn new(engine: NlSqlQueryEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Responder for SqlResponder {
    async fn respond(&self, prompt: &str) -> Result<ChatReply, AppError> {
        let result = self.engine.query(prompt).await?;
        Ok(ChatReply::new(
            result.response,
            ContextPanel::Sql {
                sql_query: result.sql_query,
                rows: result.rows,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::run_turn;
    use crate::models::{ChatSession, DocumentChunk};
    use crate::services::testing::{FakeEmbedder, FakeModel, FakeStore};

    fn pipeline(model: FakeModel, store: FakeStore) -> RagPipeline {
        RagPipeline::new(
            Arc::new(model),
            Arc::new(FakeEmbedder),
            Arc::new(store),
            "arxiv_papers",
            3,
        )
    }

    #[tokio::test]
    async fn test_arxiv_reply_pairs_titles_and_abstracts() {
        let store = FakeStore::default()
            .with_field("abstract", &["abs one", "abs two"])
            .with_field("title", &["Title one", "Title two", "Title three"]);
        let responder = ArxivResponder::new(pipeline(FakeModel::replying("Answer: Transformers."), store));

        let reply = responder.respond("what is a transformer?").await.unwrap();

        let Some(ContextPanel::Papers(papers)) = reply.panel else {
            panic!("expected papers panel");
        };
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1].title, "Title two");
        assert_eq!(papers[1].abstract_text, "abs two");
    }

    #[tokio::test]
    async fn test_arxiv_unreachable_store_falls_back() {
        let responder = ArxivResponder::new(pipeline(FakeModel::replying("x"), FakeStore::unreachable()));
        let mut session = ChatSession::new();

        let reply = run_turn(&mut session, &responder, "question").await;

        assert_eq!(reply.content, "Failed to respond");
        assert!(reply.panel.is_none());
    }

    #[tokio::test]
    async fn test_pdf_sends_repository_query() {
        let model = FakeModel::replying("It is about RAG.").with_chunks(vec![DocumentChunk {
            document_name: Some("notes.pdf".to_string()),
            content: "retrieval".to_string(),
            ..Default::default()
        }]);
        let repositories = RepositoryQuery {
            ids: vec![42],
            similarity_threshold: 0.25,
            limit: 5,
        };
        let responder = PdfResponder::new(Arc::new(model.clone()), repositories.clone());

        let reply = responder.respond("what is this pdf about?").await.unwrap();

        assert_eq!(reply.content, "It is about RAG.");
        assert!(matches!(reply.panel, Some(ContextPanel::Chunks(ref c)) if c.len() == 1));

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].repositories.as_ref(), Some(&repositories));
    }

    #[tokio::test]
    async fn test_pdf_model_failure_falls_back() {
        let responder = PdfResponder::new(
            Arc::new(FakeModel::failing()),
            RepositoryQuery {
                ids: vec![1],
                similarity_threshold: 0.25,
                limit: 5,
            },
        );
        let mut session = ChatSession::new();

        let reply = run_turn(&mut session, &responder, "hi").await;

        assert_eq!(reply.content, "Failed to respond");
        assert!(reply.panel.is_none());
    }
}

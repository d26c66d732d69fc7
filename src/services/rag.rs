//! Retrieval-augmented Q&A over a Qdrant collection of papers.
//!
//! Two retrievers share one query embedding: one reads the `abstract`
//! payload field (the context handed to the model), the other reads `title`
//! (shown alongside the answer).

use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use super::llm::{ChatModel, Embedder};
use super::vector_store::VectorStore;
use crate::error::{RagError, VectorStoreError};
use crate::models::{RetrievedPaper, pair_papers};

pub const PASSAGE_FIELD: &str = "abstract";
pub const TITLE_FIELD: &str = "title";

const ANSWER_INSTRUCTIONS: &str = "Think and Answer questions based on the context provided.";

/// Reads one payload field from the nearest points of a collection.
pub struct FieldRetriever {
    store: Arc<dyn VectorStore>,
    collection: String,
    field: String,
    k: u64,
}

impl FieldRetriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        field: impl Into<String>,
        k: u64,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            field: field.into(),
            k,
        }
    }

    pub async fn retrieve(&self, query_vector: Vec<f32>) -> Result<Vec<String>, VectorStoreError> {
        let hits = self
            .store
            .search_field(&self.collection, query_vector, self.k, &self.field)
            .await?;
        Ok(hits.into_iter().map(|h| h.text).collect())
    }
}

/// Output of one RAG call.
#[derive(Debug, Clone, Default)]
pub struct RagPrediction {
    pub answer: String,
    pub context: Vec<String>,
    pub titles: Vec<String>,
}

impl RagPrediction {
    /// Titles paired with passages for the context panel.
    pub fn papers(&self) -> Vec<RetrievedPaper> {
        pair_papers(&self.titles, &self.context)
    }
}

pub struct RagPipeline {
    model: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    passages: FieldRetriever,
    titles: FieldRetriever,
}

impl RagPipeline {
    pub fn new(
        model: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: &str,
        k: u64,
    ) -> Self {
        Self {
            model,
            embedder,
            passages: FieldRetriever::new(store.clone(), collection, PASSAGE_FIELD, k),
            titles: FieldRetriever::new(store, collection, TITLE_FIELD, k),
        }
    }

    pub async fn forward(&self, question: &str) -> Result<RagPrediction, RagError> {
        let query_vector = self
            .embedder
            .embed_query(question)
            .await
            .map_err(VectorStoreError::from)?;

        let context = self.passages.retrieve(query_vector.clone()).await?;
        let titles = self.titles.retrieve(query_vector).await?;
        tracing::debug!(passages = context.len(), titles = titles.len(), "retrieved context");

        let prompt = build_answer_prompt(&context, question);
        let raw = self.model.complete(&prompt).await?;

        Ok(RagPrediction {
            answer: extract_answer(&raw),
            context,
            titles,
        })
    }
}

/// Prompt asking for a one or two line answer grounded on numbered passages.
pub fn build_answer_prompt(context: &[String], question: &str) -> String {
    let mut prompt = String::new();
    writeln!(prompt, "{ANSWER_INSTRUCTIONS}\n").ok();
    writeln!(prompt, "---\n").ok();
    writeln!(prompt, "Follow the following format.\n").ok();
    writeln!(prompt, "Context: May contain relevant facts about user query\n").ok();
    writeln!(prompt, "Question: User query\n").ok();
    writeln!(prompt, "Answer: Answer in one or two lines\n").ok();
    writeln!(prompt, "---\n").ok();

    if context.is_empty() {
        writeln!(prompt, "Context: N/A\n").ok();
    } else {
        writeln!(prompt, "Context:").ok();
        for (i, passage) in context.iter().enumerate() {
            writeln!(prompt, "[{}] «{}»", i + 1, passage.trim()).ok();
        }
        writeln!(prompt).ok();
    }

    writeln!(prompt, "Question: {}\n", question.trim()).ok();
    prompt.push_str("Answer:");
    prompt
}

/// Strip an echoed "Answer:" label and surrounding whitespace.
pub fn extract_answer(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("Answer:")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

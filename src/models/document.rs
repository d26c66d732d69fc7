//! Documents loaded from the web and chunks returned by the hosted repository.

use serde::{Deserialize, Serialize};

/// Metadata attached to a loaded web page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Plain text plus the metadata of where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }

    /// A document with only a source in its metadata.
    pub fn from_source(page_content: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(
            page_content,
            DocumentMetadata {
                source: source.into(),
                ..Default::default()
            },
        )
    }
}

/// A chunk retrieved from a hosted repository alongside a completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    #[serde(default)]
    pub repository_id: Option<u64>,

    #[serde(default)]
    pub document_id: Option<u64>,

    #[serde(default)]
    pub chunk_id: Option<u64>,

    #[serde(default)]
    pub document_name: Option<String>,

    #[serde(default)]
    pub similarity_score: Option<f32>,

    #[serde(default)]
    pub content: String,
}

/// A paper shown in the context panel of the arXiv app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPaper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// Pair titles with passages positionally; extra entries on either side are dropped.
pub fn pair_papers(titles: &[String], passages: &[String]) -> Vec<RetrievedPaper> {
    titles
        .iter()
        .zip(passages)
        .map(|(title, passage)| RetrievedPaper {
            title: title.clone(),
            abstract_text: passage.clone(),
        })
        .collect()
}

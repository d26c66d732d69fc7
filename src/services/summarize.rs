//! Map-reduce summarization of web pages.
//!
//! Chunks are summarized one by one ("map"); the partial summaries are then
//! merged with the reduce prompt, collapsing in groups first whenever their
//! combined size is above `token_max`.

use std::sync::Arc;

use serde::Serialize;

use super::llm::{ChatModel, DocumentRepository};
use super::loader::PageLoader;
use super::splitter::TextSplitter;
use crate::error::SummarizeError;
use crate::models::{Document, SummarizerConfig};
use crate::utils::{estimate_tokens, is_valid_url};

pub const MAP_TEMPLATE: &str = "
The following is a set of documents
{docs}
Based on this list of docs, please identify the main themes and extract
informations from them which are highly valuable. So the main point should
be the theme/topic and subpoints should be the information extracts of the
documents which are very invaluable.
Helpful Answer:
";

pub const REDUCE_TEMPLATE: &str = "
The following is set of summaries:
{docs}
Take this and then make a very good summary with a very human like way so that
people can use this summary to decide whether to use that resource to finally read
or not. Do not give them the decision, give them enough insights or summary
that will help them. Include the following sub headings

1. What is this is about
2. Main key takeaways
3. Things to note additionally
Helpful Answer:
";

const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Everything produced while summarizing one URL.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub url: String,
    pub input_documents: Vec<Document>,
    pub intermediate_steps: Vec<String>,
    pub output_text: String,
}

impl SummaryResult {
    /// The loaded chunks joined back into one text.
    pub fn input_text(&self) -> String {
        self.input_documents
            .iter()
            .map(|d| d.page_content.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Input,
    Intermediate,
    Summary,
}

/// A text that could not be stored in the repository.
#[derive(Debug, Clone, Serialize)]
pub struct FailedUpload {
    #[serde(rename = "type")]
    pub kind: UploadKind,
    pub name: String,
    pub content: String,
}

/// Where summaries get stored when uploading is requested.
pub struct UploadTarget<'a> {
    pub repository: &'a dyn DocumentRepository,
    pub repository_id: u64,
    pub topic: Option<&'a str>,
}

/// Outcome of summarizing a batch of URLs.
#[derive(Debug, Default, Serialize)]
pub struct UrlReport {
    pub passed: Vec<SummaryResult>,
    pub failed: Vec<String>,
    pub failed_uploads: Vec<FailedUpload>,
}

pub struct MapReduceSummarizer {
    model: Arc<dyn ChatModel>,
    splitter: TextSplitter,
    token_max: usize,
    max_collapse_rounds: u32,
}

impl MapReduceSummarizer {
    pub fn new(model: Arc<dyn ChatModel>, config: &SummarizerConfig) -> Self {
        Self {
            model,
            splitter: TextSplitter::from_config(config),
            token_max: config.token_max as usize,
            max_collapse_rounds: config.max_collapse_rounds,
        }
    }

    /// Summarize already-loaded documents. An empty document set yields `None`.
    pub async fn summarize_documents(
        &self,
        url: &str,
        documents: &[Document],
    ) -> Result<Option<SummaryResult>, SummarizeError> {
        let chunks = self.splitter.split_documents(documents);
        if chunks.is_empty() {
            return Ok(None);
        }

        let mut intermediate_steps = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let prompt = MAP_TEMPLATE.replace("{docs}", &chunk.page_content);
            intermediate_steps.push(self.model.complete(&prompt).await?);
        }
        tracing::debug!(url, chunks = chunks.len(), "map step done");

        let output_text = self.reduce(intermediate_steps.clone()).await?;

        Ok(Some(SummaryResult {
            url: url.to_string(),
            input_documents: chunks,
            intermediate_steps,
            output_text,
        }))
    }

    async fn reduce(&self, mut summaries: Vec<String>) -> Result<String, SummarizeError> {
        let mut rounds = 0;
        while total_tokens(&summaries) > self.token_max {
            if rounds >= self.max_collapse_rounds {
                return Err(SummarizeError::CollapseLimit(rounds));
            }

            let groups = group_by_token_max(&summaries, self.token_max)?;
            tracing::debug!(round = rounds, groups = groups.len(), "collapsing summaries");

            let mut collapsed = Vec::with_capacity(groups.len());
            for group in groups {
                collapsed.push(self.combine(&group).await?);
            }
            summaries = collapsed;
            rounds += 1;
        }

        self.combine(&summaries).await
    }

    async fn combine(&self, summaries: &[String]) -> Result<String, SummarizeError> {
        let prompt = REDUCE_TEMPLATE.replace("{docs}", &summaries.join(DOCUMENT_SEPARATOR));
        Ok(self.model.complete(&prompt).await?)
    }

    /// Summarize each URL in order; invalid or failing URLs land in `failed`.
    pub async fn summarize_urls(
        &self,
        loader: &dyn PageLoader,
        urls: &[String],
        upload: Option<UploadTarget<'_>>,
    ) -> UrlReport {
        let mut report = UrlReport::default();

        for (index, url) in urls.iter().enumerate() {
            if !is_valid_url(url) {
                tracing::warn!(url = %url, "skipping invalid URL");
                report.failed.push(url.clone());
                continue;
            }

            let result = match loader.load(url).await {
                Ok(documents) => self.summarize_documents(url, &documents).await,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(Some(summary)) => {
                    if let Some(target) = &upload {
                        let topic = topic_name(target.topic, url, index, urls.len());
                        let failures = upload_summary(
                            target.repository,
                            target.repository_id,
                            &topic,
                            &summary,
                        )
                        .await;
                        report.failed_uploads.extend(failures);
                    }
                    report.passed.push(summary);
                }
                Ok(None) => {
                    tracing::warn!(url = %url, "page has no text to summarize");
                    report.failed.push(url.clone());
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "summarization failed");
                    report.failed.push(url.clone());
                }
            }
        }

        report
    }
}

fn total_tokens(texts: &[String]) -> usize {
    estimate_tokens(&texts.join(DOCUMENT_SEPARATOR))
}

/// Greedily group texts so that each group stays within `token_max`.
fn group_by_token_max(
    texts: &[String],
    token_max: usize,
) -> Result<Vec<Vec<String>>, SummarizeError> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for text in texts {
        let tokens = estimate_tokens(text);
        if tokens > token_max {
            return Err(SummarizeError::DocumentTooLarge { tokens, token_max });
        }

        current.push(text.clone());
        if total_tokens(&current) > token_max {
            current.pop();
            groups.push(std::mem::take(&mut current));
            current.push(text.clone());
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    Ok(groups)
}

/// Base name for the uploaded texts of one URL.
///
/// A user-supplied topic gets a numeric suffix when several URLs share it.
pub fn topic_name(topic: Option<&str>, url: &str, index: usize, total: usize) -> String {
    match topic {
        Some(t) if total > 1 => format!("{}_{}", slugify(t), index + 1),
        Some(t) => slugify(t),
        None => slugify(
            url.split_once("://")
                .map_or(url, |(_, rest)| rest)
                .trim_end_matches('/'),
        ),
    }
}

fn slugify(text: &str) -> String {
    let slug: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = slug
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Upload the source text, every intermediate summary and the final summary.
///
/// Failures are logged and returned; they never abort the remaining uploads.
pub async fn upload_summary(
    repository: &dyn DocumentRepository,
    repository_id: u64,
    topic: &str,
    summary: &SummaryResult,
) -> Vec<FailedUpload> {
    let mut pending = vec![(
        UploadKind::Input,
        format!("{topic}_input_documents.txt"),
        summary.input_text(),
    )];
    for (i, step) in summary.intermediate_steps.iter().enumerate() {
        pending.push((
            UploadKind::Intermediate,
            format!("{topic}_intermediate_doc_num_{i}.txt"),
            step.clone(),
        ));
    }
    pending.push((
        UploadKind::Summary,
        format!("{topic}_summary.txt"),
        summary.output_text.clone(),
    ));

    let mut failed = Vec::new();
    for (kind, name, content) in pending {
        if let Err(e) = repository.upload_text(repository_id, &name, &content).await {
            tracing::warn!(name = %name, error = %e, "upload failed");
            failed.push(FailedUpload {
                kind,
                name,
                content,
            });
        }
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use crate::services::testing::{FakeModel, FakeRepository};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeLoader(HashMap<String, Vec<Document>>);

    #[async_trait]
    impl PageLoader for FakeLoader {
        async fn load(&self, url: &str) -> Result<Vec<Document>, LoaderError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| LoaderError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn echo_model() -> FakeModel {
        FakeModel::with_handler(|prompt| {
            if prompt.contains("The following is a set of documents") {
                Ok("theme: retrieval".to_string())
            } else {
                Ok("1. What is this is about: RAG".to_string())
            }
        })
    }

    fn small_config() -> SummarizerConfig {
        SummarizerConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            token_max: 4000,
            max_collapse_rounds: 3,
        }
    }

    fn page(url: &str, paragraphs: usize) -> Document {
        let text = (0..paragraphs)
            .map(|i| format!("paragraph {i} {}", "x".repeat(20)))
            .collect::<Vec<_>>()
            .join("\n\n");
        Document::from_source(text, url)
    }

    #[tokio::test]
    async fn test_map_then_reduce() {
        let model = echo_model();
        let summarizer = MapReduceSummarizer::new(Arc::new(model.clone()), &small_config());

        let result = summarizer
            .summarize_documents("https://a.dev", &[page("https://a.dev", 3)])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.input_documents.len(), 3);
        assert_eq!(result.intermediate_steps, vec!["theme: retrieval"; 3]);
        assert_eq!(result.output_text, "1. What is this is about: RAG");

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 4);
        assert!(prompts[3].contains("The following is set of summaries:"));
        assert!(prompts[3].contains("theme: retrieval\n\ntheme: retrieval"));
    }

    #[tokio::test]
    async fn test_empty_documents_yield_none() {
        let model = echo_model();
        let summarizer = MapReduceSummarizer::new(Arc::new(model.clone()), &small_config());

        assert!(summarizer.summarize_documents("u", &[]).await.unwrap().is_none());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_collapse_when_over_token_max() {
        let model = FakeModel::with_handler(|_| Ok("s".repeat(40)));
        let config = SummarizerConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            token_max: 25,
            max_collapse_rounds: 5,
        };
        let summarizer = MapReduceSummarizer::new(Arc::new(model.clone()), &config);

        // 4 map outputs of 10 tokens each: 42 tokens combined, collapsed into 2 groups.
        let result = summarizer
            .summarize_documents("u", &[page("u", 4)])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.intermediate_steps.len(), 4);
        // 4 map + 2 collapse + 1 final combine
        assert_eq!(model.prompts().len(), 7);
    }

    #[tokio::test]
    async fn test_single_summary_over_token_max_errors() {
        let model = FakeModel::with_handler(|_| Ok("s".repeat(400)));
        let config = SummarizerConfig {
            chunk_size: 10,
            chunk_overlap: 0,
            token_max: 50,
            max_collapse_rounds: 5,
        };
        let summarizer = MapReduceSummarizer::new(Arc::new(model), &config);
        let result = summarizer.summarize_documents("u", &[page("u", 2)]).await;
        assert!(matches!(result, Err(SummarizeError::DocumentTooLarge { .. })));
    }

    #[test]
    fn test_group_by_token_max() {
        let texts = vec!["a".repeat(40), "b".repeat(40), "c".repeat(40)];
        let groups = group_by_token_max(&texts, 20).unwrap();
        assert_eq!(groups.len(), 3);

        let groups = group_by_token_max(&texts, 25).unwrap();
        assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_summarize_urls_sorts_passed_and_failed() {
        let loader = FakeLoader(
            [
                ("https://good.dev".to_string(), vec![page("https://good.dev", 1)]),
                ("https://empty.dev".to_string(), Vec::new()),
            ]
            .into_iter()
            .collect(),
        );
        let summarizer = MapReduceSummarizer::new(Arc::new(echo_model()), &small_config());
        let urls: Vec<String> = ["https://good.dev", "not a url", "https://empty.dev", "https://gone.dev"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = summarizer.summarize_urls(&loader, &urls, None).await;

        assert_eq!(report.passed.len(), 1);
        assert_eq!(report.passed[0].url, "https://good.dev");
        assert_eq!(
            report.failed,
            vec!["not a url", "https://empty.dev", "https://gone.dev"]
        );
    }

    #[tokio::test]
    async fn test_empty_page_uploads_nothing() {
        let loader = FakeLoader(
            [("https://empty.dev".to_string(), Vec::new())]
                .into_iter()
                .collect(),
        );
        let repository = FakeRepository::default();
        let summarizer = MapReduceSummarizer::new(Arc::new(echo_model()), &small_config());

        let report = summarizer
            .summarize_urls(
                &loader,
                &["https://empty.dev".to_string()],
                Some(UploadTarget {
                    repository: &repository,
                    repository_id: 7,
                    topic: Some("rag"),
                }),
            )
            .await;

        assert!(report.passed.is_empty());
        assert!(repository.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_summary_names_and_failures() {
        let summary = SummaryResult {
            url: "https://a.dev".to_string(),
            input_documents: vec![Document::from_source("one", "u"), Document::from_source("two", "u")],
            intermediate_steps: vec!["i0".to_string(), "i1".to_string()],
            output_text: "final".to_string(),
        };
        let repository = FakeRepository::failing_on("intermediate_doc_num_1");

        let failed = upload_summary(&repository, 9, "rag", &summary).await;

        let names: Vec<String> = repository.uploads().into_iter().map(|(_, n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "rag_input_documents.txt",
                "rag_intermediate_doc_num_0.txt",
                "rag_summary.txt"
            ]
        );
        assert_eq!(repository.uploads()[0].2, "one\n\ntwo");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind, UploadKind::Intermediate);
        assert_eq!(failed[0].content, "i1");
    }

    #[tokio::test]
    async fn test_failed_summary_upload_keeps_summary_text() {
        let summary = SummaryResult {
            url: "https://a.dev".to_string(),
            input_documents: vec![Document::from_source("one", "u")],
            intermediate_steps: vec!["i0".to_string()],
            output_text: "final summary".to_string(),
        };
        let repository = FakeRepository::failing_on("_summary.txt");

        let failed = upload_summary(&repository, 9, "rag", &summary).await;

        assert_eq!(repository.uploads().len(), 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind, UploadKind::Summary);
        assert_eq!(failed[0].name, "rag_summary.txt");
        assert_eq!(failed[0].content, "final summary");
    }

    #[test]
    fn test_topic_name() {
        assert_eq!(topic_name(Some("My Topic"), "u", 0, 1), "my_topic");
        assert_eq!(topic_name(Some("rag"), "u", 1, 3), "rag_2");
        assert_eq!(
            topic_name(None, "https://arxiv.org/abs/1706.03762/", 0, 1),
            "arxiv_org_abs_1706_03762"
        );
        assert_eq!(topic_name(Some("!!!"), "u", 0, 1), "untitled");
    }
}

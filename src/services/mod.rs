mod llm;
mod loader;
mod prem;
mod rag;
mod repository;
mod splitter;
mod sql;
mod summarize;
pub mod vector_store;

#[cfg(test)]
pub mod testing;

pub use llm::{
    ChatModel, ChatRequest, Completion, DocumentRepository, Embedder, RepositoryQuery,
    UploadedDocument,
};
pub use loader::{PageLoader, WebLoader, html_to_document};
pub use prem::PremClient;
pub use rag::{RagPipeline, RagPrediction};
pub use repository::{check_upload, upload_pdf};
pub use splitter::TextSplitter;
pub use sql::{NlSqlQueryEngine, QueryRunner, SqlDatabase, SqlResponse, extract_sql, list_tables};
pub use summarize::{
    FailedUpload, MapReduceSummarizer, SummaryResult, UploadKind, UploadTarget, UrlReport,
    upload_summary,
};
pub use vector_store::{QdrantBackend, ScoredText, VectorStore};

//! Terminal chat shared by the arXiv, PDF and SQL apps.
//!
//! Every app plugs a [`Responder`] into the same loop: the reply is replayed
//! with a typewriter effect and followed by an app-specific context panel.

mod panel;
mod repl;
mod responders;
mod typewriter;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::models::{ChatMessage, ChatSession, DocumentChunk, RetrievedPaper};

pub use panel::render_panel;
pub use repl::ChatLoop;
pub use responders::{ArxivResponder, PdfResponder, SqlResponder};
pub use typewriter::{CURSOR, Typewriter};

/// Shown in place of the answer whenever the model or retrieval call fails.
pub const FALLBACK_REPLY: &str = "Failed to respond";

/// Extra information displayed under an answer.
#[derive(Debug, Clone)]
pub enum ContextPanel {
    /// Paper titles with their abstracts.
    Papers(Vec<RetrievedPaper>),
    /// Repository chunks used to ground a completion.
    Chunks(Vec<DocumentChunk>),
    /// The generated query and the rows it returned.
    Sql { sql_query: String, rows: Vec<Value> },
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub panel: Option<ContextPanel>,
}

impl ChatReply {
    pub fn new(content: impl Into<String>, panel: ContextPanel) -> Self {
        Self {
            content: content.into(),
            panel: Some(panel),
        }
    }

    pub fn fallback() -> Self {
        Self {
            content: FALLBACK_REPLY.to_string(),
            panel: None,
        }
    }
}

/// Produces an answer for one user prompt.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, prompt: &str) -> Result<ChatReply, AppError>;
}

/// Run one exchange, recording both sides in `session`.
///
/// A failing responder, or one that returns an empty reply, is logged and
/// turned into the fallback reply.
pub async fn run_turn(
    session: &mut ChatSession,
    responder: &dyn Responder,
    prompt: &str,
) -> ChatReply {
    session.push(ChatMessage::user(prompt));

    let reply = match responder.respond(prompt).await {
        Ok(reply) if !reply.content.trim().is_empty() => reply,
        Ok(_) => {
            tracing::warn!("responder returned an empty reply");
            ChatReply::fallback()
        }
        Err(e) => {
            tracing::warn!(error = %e, "responder failed");
            ChatReply::fallback()
        }
    };

    session.push(ChatMessage::assistant(reply.content.clone()));
    reply
}

mod arxiv;
mod config;
mod pdf;
mod sql;
mod status;
mod summarize;

pub use arxiv::ArxivArgs;
pub use config::ConfigCommand;
pub use pdf::PdfCommand;
pub use sql::SqlCommand;
pub use summarize::SummarizeArgs;

pub use arxiv::{handle_arxiv, handle_collections};
pub use config::handle_config;
pub use pdf::handle_pdf;
pub use sql::handle_sql;
pub use status::handle_status;
pub use summarize::handle_summarize;

//! Utility modules.

pub mod file;
pub mod retry;
pub mod text;
pub mod url;

pub use file::{StagedFile, calculate_checksum, clear_staging, is_pdf, stage_file};
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
pub use text::{estimate_tokens, normalize_whitespace, preview};
pub use url::{is_valid_url, split_url_list};

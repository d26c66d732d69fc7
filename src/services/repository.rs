//! PDF uploads into a hosted document repository.

use std::path::Path;

use super::llm::{DocumentRepository, UploadedDocument};
use crate::error::RepositoryError;
use crate::models::RepositoryConfig;
use crate::utils::{StagedFile, is_pdf, stage_file};

/// Reject anything that is not a PDF within the configured size limit.
pub fn check_upload(path: &Path, max_file_size: u64) -> Result<u64, RepositoryError> {
    let name = path.display().to_string();
    if !is_pdf(path) {
        return Err(RepositoryError::UnsupportedFile(format!("{name} is not a PDF")));
    }

    let size = std::fs::metadata(path)?.len();
    if size > max_file_size {
        return Err(RepositoryError::FileTooLarge {
            name,
            size,
            max: max_file_size,
        });
    }
    Ok(size)
}

/// Stage one file and upload the staged copy.
pub async fn upload_pdf(
    repository: &dyn DocumentRepository,
    repository_id: u64,
    config: &RepositoryConfig,
    path: &Path,
) -> Result<(StagedFile, UploadedDocument), RepositoryError> {
    check_upload(path, config.max_file_size)?;
    let staged = stage_file(path, &config.staging_dir)?;
    tracing::debug!(name = %staged.name, checksum = %staged.checksum, "staged file");

    let document = repository.upload_file(repository_id, &staged.path).await?;
    Ok((staged, document))
}

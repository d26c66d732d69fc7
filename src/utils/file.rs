//! Local staging of files before they are uploaded to a hosted repository.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// A file copied into the staging directory.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub checksum: String,
}

/// Calculate SHA-256 checksum of raw bytes.
pub fn calculate_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// True when the path carries a `.pdf` extension (case-insensitive).
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
}

/// Copy `source` into `staging_dir`, creating the directory if needed.
///
/// Files with the same name overwrite earlier staged copies.
pub fn stage_file(source: &Path, staging_dir: &Path) -> std::io::Result<StagedFile> {
    fs::create_dir_all(staging_dir)?;

    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a file: {}", source.display()),
            )
        })?;

    let bytes = fs::read(source)?;
    let path = staging_dir.join(&name);
    fs::write(&path, &bytes)?;

    Ok(StagedFile {
        name,
        path,
        size_bytes: bytes.len() as u64,
        checksum: calculate_checksum(&bytes),
    })
}

/// Remove the staging directory. Returns the number of files removed.
pub fn clear_staging(staging_dir: &Path) -> std::io::Result<usize> {
    if !staging_dir.exists() {
        return Ok(0);
    }
    let count = fs::read_dir(staging_dir)?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .count();
    fs::remove_dir_all(staging_dir)?;
    Ok(count)
}

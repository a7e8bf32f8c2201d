//! Upload storage
//!
//! Attached files are written to a single local directory as
//! `<epoch-millis><original-extension>` and served read-only under the
//! public prefix.

use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::UploadConfig;
use crate::schema::FileReference;

/// Bounded search for a free name when several uploads land in the same millisecond
const MAX_NAME_ATTEMPTS: i64 = 1000;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to prepare upload directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write upload {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free upload name after {0} attempts")]
    NameExhausted(i64),
}

/// A file written by `UploadStore::save`
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Generated name, e.g. `1718000000000.jpg`
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_prefix: String,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self { dir: dir.into(), public_prefix: public_prefix.into() }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.dir.clone(), config.public_prefix.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// URL prefix the directory is served under (`/uploads`)
    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Create the upload directory if it does not exist
    pub async fn prepare(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.dir).await.map_err(|source| UploadError::Prepare {
            path: self.dir.clone(),
            source,
        })?;
        info!("Upload directory ready at {}", self.dir.display());
        Ok(())
    }

    /// Write `bytes` under a fresh timestamp name. Existing files are never
    /// overwritten; on collision the timestamp is bumped.
    pub async fn save(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, UploadError> {
        let ext = extension_of(original_name.unwrap_or_default());
        let start = Utc::now().timestamp_millis();

        for offset in 0..MAX_NAME_ATTEMPTS {
            let filename = generated_name(start + offset, &ext);
            let path = self.dir.join(&filename);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(UploadError::Write { path, source }),
            };

            let written = async {
                file.write_all(bytes).await?;
                file.flush().await
            }
            .await;
            if let Err(source) = written {
                return Err(UploadError::Write { path, source });
            }

            debug!("Stored upload {} ({} bytes)", path.display(), bytes.len());
            return Ok(StoredFile { filename, path, size: bytes.len() });
        }

        Err(UploadError::NameExhausted(MAX_NAME_ATTEMPTS))
    }

    /// Value embedded in the record for a stored file
    pub fn reference(&self, file: &StoredFile, kind: FileReference) -> String {
        match kind {
            FileReference::FileName => file.filename.clone(),
            FileReference::StoredPath => {
                format!("{}/{}", self.public_prefix.trim_matches('/'), file.filename)
            }
        }
    }
}

pub fn generated_name(millis: i64, ext: &str) -> String {
    format!("{}{}", millis, ext)
}

/// Extension of the final path component including the leading dot, or ""
/// when there is none. Anything but `[A-Za-z0-9_-]` after the dot is dropped.
pub fn extension_of(original_name: &str) -> String {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or_default();
    match Path::new(base).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') => {
            format!(".{}", ext)
        }
        _ => String::new(),
    }
}

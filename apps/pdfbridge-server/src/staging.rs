//! Temporary storage for uploaded files.
//!
//! Uploads are written under a generated, collision-free name and deleted
//! again before the response goes out. Cleanup is idempotent: a path that is
//! already gone is not an error, and deletion failures are logged and
//! swallowed, since a leaked temp file is a hygiene problem rather than a
//! correctness one.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// An uploaded file staged to disk for the duration of one request.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Owns the upload directory and the staging naming scheme.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Create the staging manager, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write uploaded bytes to disk under a generated name.
    pub async fn stage(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> io::Result<StagedFile> {
        let path = self.dir.join(staged_name(original_name));
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "staged upload");

        Ok(StagedFile {
            path,
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
        })
    }

    /// Delete every staged file. Missing paths are fine; other failures are
    /// logged and swallowed.
    pub async fn cleanup(&self, files: &[StagedFile]) {
        for file in files {
            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => debug!(path = %file.path.display(), "removed staged file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "failed to remove staged file")
                }
            }
        }
    }
}

/// Collision-free staging name: millisecond timestamp plus a random suffix,
/// keeping the original extension so the conversion engine can sniff it.
fn staged_name(original_name: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple();
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{}.{}", timestamp, suffix, ext.to_ascii_lowercase()),
        None => format!("{}-{}", timestamp, suffix),
    }
}

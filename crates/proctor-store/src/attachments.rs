//! Attachment storage on the local filesystem.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use uuid::Uuid;

use proctor_core::error::AttachmentError;
use proctor_core::model::AttachmentRef;
use proctor_core::traits::AttachmentStore;

/// Stores each upload as `<uuid>-<name>` in a single directory.
pub struct LocalAttachmentStore {
    dir: PathBuf,
}

impl LocalAttachmentStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Resolve a reference to its path, refusing anything that is not a
    /// plain file name.
    fn resolve(&self, reference: &AttachmentRef) -> Option<PathBuf> {
        let name = reference.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.dir.join(name))
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<AttachmentRef, AttachmentError> {
        let reference = AttachmentRef::new(format!("{}-{}", Uuid::new_v4(), sanitize(name)));
        let path = self.dir.join(reference.as_str());
        let unavailable = |e: std::io::Error| AttachmentError::Unavailable(e.to_string());

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(unavailable)?;
        tmp.write_all(&bytes).map_err(unavailable)?;
        tmp.as_file().sync_all().map_err(unavailable)?;
        tmp.persist(&path).map_err(|e| unavailable(e.error))?;

        tracing::debug!(attachment = %reference, size = bytes.len(), "stored attachment");
        Ok(reference)
    }

    async fn confirm(&self, reference: &AttachmentRef) -> Result<(), AttachmentError> {
        let path = self
            .resolve(reference)
            .ok_or_else(|| AttachmentError::Missing(reference.to_string()))?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(AttachmentError::Missing(reference.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AttachmentError::Missing(reference.to_string()))
            }
            Err(e) => Err(AttachmentError::Unavailable(e.to_string())),
        }
    }
}

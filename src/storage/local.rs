use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::{BlobStore, StorageError, UploadedFile, object_key};

/// Writes uploads under a local directory that the server exposes at `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: format!("{}/uploads/", public_base_url.trim_end_matches('/')),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(
        &self,
        folder: &str,
        owner: Uuid,
        file: &UploadedFile,
    ) -> Result<String, StorageError> {
        let key = object_key(folder, owner, &file.file_name);
        let path = self.root.join(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &file.bytes).await?;
        tracing::debug!(key = %key, bytes = file.bytes.len(), "stored upload");
        Ok(format!("{}{key}", self.public_prefix))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = url
            .strip_prefix(&self.public_prefix)
            .filter(|key| !key.split('/').any(|part| part == ".."))
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        match fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

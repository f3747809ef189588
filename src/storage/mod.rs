mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("url does not belong to this store: {0}")]
    ForeignUrl(String),
}

/// Stores blobs and hands back a public URL for each.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `file` under `folder/owner` and return its public URL.
    async fn store(
        &self,
        folder: &str,
        owner: Uuid,
        file: &UploadedFile,
    ) -> Result<String, StorageError>;

    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// Object key for an upload: `folder/owner/<uuid>-<safe name>`.
pub fn object_key(folder: &str, owner: Uuid, file_name: &str) -> String {
    format!(
        "{folder}/{owner}/{}-{}",
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    )
}

fn sanitize_file_name(name: &str) -> String {
    // keep only the final path segment
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Delete uploaded blobs whose owning rows never made it to the database.
pub async fn discard_blobs(store: &dyn BlobStore, urls: &[String]) {
    for url in urls {
        if let Err(err) = store.delete(url).await {
            tracing::warn!(url = %url, error = %err, "failed to discard orphaned upload");
        }
    }
}

// crates/strand-store/src/blobs.rs
//
// Filesystem content-addressed blob store.
//
// Layout: one file per blob at `{root}/{content_hash_hex}`. Writes go to a
// uniquely named temp file first and are renamed into place, so a reader
// never observes a partially written blob.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use strand_core::error::StrandError;
use strand_core::ids::ContentHash;
use strand_core::traits::ContentStore;

/// Blob directory implementing `ContentStore`.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (creating if needed) a blob directory.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StrandError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            StrandError::Storage(format!("Failed to create blob dir {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.to_hex())
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentHash, StrandError> {
        let hash = ContentHash::of(data);
        let path = self.blob_path(&hash);
        if tokio::fs::try_exists(&path).await? {
            return Ok(hash);
        }

        let tmp = self
            .root
            .join(format!(".{}.tmp-{}", hash.to_hex(), uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StrandError::Storage(format!(
                "Failed to move blob {} into place: {}",
                hash.short(),
                e
            )));
        }
        tracing::debug!("Stored blob {} ({} bytes)", hash.short(), data.len());
        Ok(hash)
    }

    async fn get(&self, hash: &ContentHash) -> Result<Option<Vec<u8>>, StrandError> {
        match tokio::fs::read(self.blob_path(hash)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, hash: &ContentHash) -> Result<bool, StrandError> {
        Ok(tokio::fs::try_exists(self.blob_path(hash)).await?)
    }

    async fn list(&self) -> Result<Vec<(ContentHash, u64)>, StrandError> {
        let mut out = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            // Temp files start with '.', everything else must be a hex hash.
            let Some(hash) = name.to_str().and_then(|n| n.parse::<ContentHash>().ok()) else {
                continue;
            };
            let size = item.metadata().await?.len();
            out.push((hash, size));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

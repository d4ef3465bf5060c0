//! Photo blob storage. The backend owns persistence and any image
//! post-processing (resize to at most 800x600, optimization); callers only
//! see an opaque key and the final byte size.

use std::path::PathBuf;

use tracing::info;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone)]
pub struct StoredPhoto {
    /// Generated storage key, e.g. `3f1a….jpg`. Never the original name.
    pub key: String,
    pub size: i64,
}

pub trait PhotoStorage {
    fn store(
        &self,
        data: &[u8],
        extension: &str,
    ) -> impl Future<Output = anyhow::Result<StoredPhoto>> + Send;
}

/// Extracts the lowercased extension when the name carries an allowed one.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Filesystem-backed storage under a configured upload directory.
#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    upload_dir: PathBuf,
}

impl LocalPhotoStorage {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub async fn ensure_dir(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }
}

impl PhotoStorage for LocalPhotoStorage {
    async fn store(&self, data: &[u8], extension: &str) -> anyhow::Result<StoredPhoto> {
        let key = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.upload_dir.join(&key);

        tokio::fs::write(&path, data).await?;
        let size = tokio::fs::metadata(&path).await?.len() as i64;

        info!(key = %key, size, "фотография сохранена");

        Ok(StoredPhoto { key, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert_eq!(allowed_extension("crack.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("wall.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(allowed_extension("site.plan.png").as_deref(), Some("png"));
        assert_eq!(allowed_extension("anim.gif").as_deref(), Some("gif"));

        assert_eq!(allowed_extension("notes.txt"), None);
        assert_eq!(allowed_extension("archive.tar.gz"), None);
        assert_eq!(allowed_extension("no_extension"), None);
    }

    #[tokio::test]
    async fn local_storage_generates_opaque_keys() {
        let dir = std::env::temp_dir().join(format!("photos-{}", Uuid::new_v4()));
        let storage = LocalPhotoStorage::new(&dir);
        storage.ensure_dir().await.unwrap();

        let stored = storage.store(b"fake image bytes", "png").await.unwrap();

        assert!(stored.key.ends_with(".png"));
        assert!(!stored.key.contains("fake"));
        assert_eq!(stored.size, 16);
        assert!(dir.join(&stored.key).exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

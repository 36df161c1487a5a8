use async_trait::async_trait;
use std::path::PathBuf;

use super::{ImageStore, StorageError};

/// Writes uploads into a directory served by the app under `/uploads`.
#[derive(Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(dir: PathBuf, base_url: &str) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<String, StorageError> {
        let path = self.dir.join(key);
        tokio::fs::write(&path, data).await?;
        log::debug!("Stored upload at {}", path.display());
        Ok(format!("{}/uploads/{}", self.base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn put_writes_file_and_returns_uploads_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().join("uploads"), "http://localhost:5000/").unwrap();

        let url = store.put("abc_wing.png", b"png-bytes", "image/png").await.unwrap();

        assert_eq!(url, "http://localhost:5000/uploads/abc_wing.png");
        let written = std::fs::read(store.dir().join("abc_wing.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }
}

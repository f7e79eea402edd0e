//! Local filesystem storage for photo binaries.

use std::path::{Path, PathBuf};

use tokio::fs::{DirBuilder, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::models::Photo;

/// Directory photos are written into.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Absolute path a photo is stored at.
    pub fn photo_path(&self, photo: &Photo) -> Result<PathBuf> {
        let root = std::path::absolute(&self.root_dir)?;
        Ok(root.join(photo.file_name()))
    }

    /// Ensure the root directory exists.
    pub async fn ensure_dir(&self) -> Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&self.root_dir).await?;
        Ok(())
    }

    /// Open `path` for writing, truncating any earlier download.
    pub async fn create(&self, path: &Path) -> Result<File> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await?;
        Ok(file)
    }

    /// Stream a response body into `file`, returning the bytes written.
    pub async fn write_body(&self, file: File, mut response: reqwest::Response) -> Result<u64> {
        let mut writer = BufWriter::new(file);
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn photo(id: &str) -> Photo {
        Photo {
            id: id.to_string(),
            ..Photo::default()
        }
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("a/b"));

        storage.ensure_dir().await.unwrap();
        storage.ensure_dir().await.unwrap();
        assert!(tmp.path().join("a/b").is_dir());
    }

    #[test]
    fn test_photo_path_is_absolute() {
        let storage = LocalStorage::new("relative/out");
        let path = storage.photo_path(&photo("abc123")).unwrap();

        assert!(path.is_absolute());
        assert!(path.ends_with("relative/out/abc123.jpg"));
    }

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let path = storage.photo_path(&photo("x")).unwrap();
        std::fs::write(&path, b"old contents").unwrap();

        let mut file = storage.create(&path).await.unwrap();
        file.write_all(b"new").await.unwrap();
        file.flush().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}

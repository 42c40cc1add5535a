use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// 本機檔案儲存；相對路徑以 `base_path` 為根，絕對路徑照原樣使用
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(Path::new(path))
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage
            .write_file("nested/out/geocoded.csv", b"id\n1\n")
            .await
            .unwrap();

        let data = storage.read_file("nested/out/geocoded.csv").await.unwrap();
        assert_eq!(data, b"id\n1\n");
        assert!(temp_dir.path().join("nested/out/geocoded.csv").exists());
    }

    #[tokio::test]
    async fn test_absolute_paths_ignore_base() {
        let temp_dir = TempDir::new().unwrap();
        let absolute = temp_dir.path().join("input.csv");
        std::fs::write(&absolute, b"id,name,address,city\n").unwrap();

        let storage = LocalStorage::new("/definitely/not/here");
        let data = storage.read_file(absolute.to_str().unwrap()).await.unwrap();
        assert_eq!(data, b"id,name,address,city\n");
    }
}

use anyhow::Result;
use async_trait::async_trait;

/// Minimal key-value persistence surface. Keys are slash-separated
/// paths; the backing medium is an implementation detail.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    async fn write(&self, path: &str, content: &[u8]) -> Result<()>;
    async fn delete(&self, path: &str) -> Result<()>;
    async fn exists(&self, path: &str) -> Result<bool>;
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

pub struct NativeStorage;

impl NativeStorage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for NativeStorage {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if tokio::fs::try_exists(path).await? {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = std::path::Path::new(prefix);
        let mut entries = Vec::new();

        if path.is_dir() {
            let mut dir = tokio::fs::read_dir(path).await?;
            while let Some(entry) = dir.next_entry().await? {
                entries.push(entry.path().to_string_lossy().to_string());
            }
        } else if path.exists() {
            entries.push(prefix.to_string());
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let storage = NativeStorage::new();
        let key = dir
            .path()
            .join("nested/entry.json")
            .to_string_lossy()
            .to_string();

        storage.write(&key, b"{\"ok\":true}").await.unwrap();
        assert!(storage.exists(&key).await.unwrap());
        assert_eq!(storage.read(&key).await.unwrap(), b"{\"ok\":true}");

        storage.delete(&key).await.unwrap();
        assert!(!storage.exists(&key).await.unwrap());
        // Deleting a missing key is a no-op.
        storage.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = NativeStorage::new();
        let root = dir.path().to_string_lossy().to_string();

        storage.write(&format!("{}/a.json", root), b"a").await.unwrap();
        storage.write(&format!("{}/b.json", root), b"b").await.unwrap();

        let mut listed = storage.list(&root).await.unwrap();
        listed.sort();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].ends_with("a.json"));

        let empty = storage.list(&format!("{}/missing", root)).await.unwrap();
        assert!(empty.is_empty());
    }
}

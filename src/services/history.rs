use crate::core::io::Storage;
use crate::core::story::Story;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Saved-story library over an opaque key-value storage. One JSON
/// document per story, keyed by story id.
pub struct StoryStore {
    storage: Arc<dyn Storage>,
    folder: String,
}

impl StoryStore {
    pub fn new(storage: Arc<dyn Storage>, folder: &str) -> Self {
        Self {
            storage,
            folder: folder.trim_end_matches('/').to_string(),
        }
    }

    fn key(&self, id: &str) -> String {
        format!("{}/{}.json", self.folder, id)
    }

    pub async fn put(&self, story: &Story) -> Result<()> {
        let content = serde_json::to_string_pretty(story)?;
        self.storage
            .write(&self.key(&story.id), content.as_bytes())
            .await
            .with_context(|| format!("Failed to save story {}", story.id))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Story>> {
        let key = self.key(id);
        if !self.storage.exists(&key).await? {
            return Ok(None);
        }
        let bytes = self.storage.read(&key).await?;
        let story = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse saved story {}", id))?;
        Ok(Some(story))
    }

    /// All saved stories, newest first. Entries that no longer parse
    /// are logged and skipped rather than poisoning the whole list.
    pub async fn get_all(&self) -> Result<Vec<Story>> {
        let mut stories = Vec::new();
        for key in self.storage.list(&self.folder).await? {
            if !key.ends_with(".json") {
                continue;
            }
            let bytes = self.storage.read(&key).await?;
            match serde_json::from_slice::<Story>(&bytes) {
                Ok(story) => stories.push(story),
                Err(e) => log::warn!("Skipping unreadable story at {}: {}", key, e),
            }
        }
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stories)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.storage.delete(&self.key(id)).await
    }

    pub async fn contains(&self, id: &str) -> Result<bool> {
        self.storage.exists(&self.key(id)).await
    }
}

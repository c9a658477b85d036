//! Image object storage.
//!
//! Objects are flat files addressed by key. Public URLs are the configured
//! base followed by the key, so a URL can be mapped back to the key it was
//! generated from.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub modified: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn public_url(&self, key: &str) -> String;

    /// Maps a public URL back to its key. `None` for URLs this store did not issue.
    fn key_for_url(&self, url: &str) -> Option<String>;

    /// Deleting a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn list(&self) -> Result<Vec<StoredObject>>;
}

/// Generates a fresh object key, keeping the lowercased extension of `filename`.
#[must_use]
pub fn new_object_key(filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_string(), str::to_ascii_lowercase);

    format!("{}.{}", uuid::Uuid::new_v4(), extension)
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[derive(Clone)]
pub struct LocalObjectStore {
    root: PathBuf,

    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            anyhow::bail!("Invalid object key: {key}");
        }
        Ok(self.root.join(key))
    }
}

#[async_trait::async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write object to {}", path.display()))?;

        info!(key = %key, size = bytes.len(), "Stored object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let key = url
            .strip_prefix(&self.public_base_url)?
            .strip_prefix('/')?;

        is_valid_key(key).then(|| key.to_string())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Deleted object");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    async fn list(&self) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();

        if !self.root.exists() {
            return Ok(objects);
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let key = entry.file_name().to_string_lossy().to_string();
            if !is_valid_key(&key) {
                continue;
            }

            let modified = metadata
                .modified()
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);

            objects.push(StoredObject { key, modified });
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(objects)
    }
}

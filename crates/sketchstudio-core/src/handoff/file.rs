//! JSON-file handoff store for native platforms.

use super::{DesignHandoff, HandoffError, HandoffResult, HandoffStore};
use crate::BoxFuture;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each handoff as `<key>.json` under a base directory.
pub struct FileHandoffStore {
    base_path: PathBuf,
}

impl FileHandoffStore {
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> HandoffResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                HandoffError::Io(format!("Failed to create handoff directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// `<local data dir>/sketchstudio/handoff/`.
    pub fn default_location() -> HandoffResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| HandoffError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("sketchstudio").join("handoff"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn handoff_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }
}

impl HandoffStore for FileHandoffStore {
    fn save(&self, key: &str, handoff: &DesignHandoff) -> BoxFuture<'_, HandoffResult<()>> {
        let path = self.handoff_path(key);
        let json = handoff.to_json();
        Box::pin(async move {
            fs::write(&path, json?).map_err(|e| {
                HandoffError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, HandoffResult<DesignHandoff>> {
        let path = self.handoff_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(HandoffError::NotFound(key));
            }
            let json = fs::read_to_string(&path).map_err(|e| {
                HandoffError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let handoff = DesignHandoff::from_json(&json)?;
            log::debug!("loaded {} handoff from {}", handoff.mode(), path.display());
            Ok(handoff)
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, HandoffResult<()>> {
        let path = self.handoff_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    HandoffError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, HandoffResult<bool>> {
        let path = self.handoff_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handoff::{HandoffMode, LATEST_HANDOFF_KEY};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_load() {
        let dir = tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().to_path_buf()).unwrap();

        store.save(LATEST_HANDOFF_KEY, &DesignHandoff::demo()).await.unwrap();
        let loaded = store.load(LATEST_HANDOFF_KEY).await.unwrap();
        assert_eq!(loaded.mode(), HandoffMode::Demo);
        assert!(dir.path().join("latest.json").exists());
    }

    #[tokio::test]
    async fn test_tampered_file_is_rejected() {
        let dir = tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().to_path_buf()).unwrap();
        fs::write(
            dir.path().join("latest.json"),
            r#"{"prompt":"","sketchImage":"data:image/png;base64,iVBORw0KGgo="}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load(LATEST_HANDOFF_KEY).await,
            Err(HandoffError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_sanitizes_key() {
        let dir = tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().to_path_buf()).unwrap();

        store.save("../escape", &DesignHandoff::demo()).await.unwrap();
        assert!(dir.path().join("___escape.json").exists());
        assert!(store.exists("../escape").await.unwrap());
        store.delete("../escape").await.unwrap();
        assert!(!store.exists("../escape").await.unwrap());
    }

    #[tokio::test]
    async fn test_not_found() {
        let dir = tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(store.load("nope").await, Err(HandoffError::NotFound(_))));
    }
}

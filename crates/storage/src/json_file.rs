use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cakap_core::model::{ActivityStats, ProgressMap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::repository::{ProgressRepository, StatsRepository, StorageError};

/// Key holding the level progress payload.
pub const PROGRESS_KEY: &str = "cakapgo_progress";
/// Key holding the activity stats payload.
pub const STATS_KEY: &str = "cakapgo_stats";

/// Key-value store kept as a single JSON object on disk.
///
/// Each key holds one JSON document, the way browser local storage keeps
/// `cakapgo_progress`. A missing file reads as an empty store. Writes go to a
/// sibling temp file that is renamed over the store, and a store that no
/// longer decodes is replaced on the next write.
pub struct JsonFileRepository {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    write_lock: Mutex<()>,
}

impl JsonFileRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(StorageError::Connection(err.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw).map_err(|err| StorageError::Serialization(err.to_string()))
    }

    // A store that does not decode is replaced, not merged into.
    async fn read_document_for_write(&self) -> Result<Map<String, Value>, StorageError> {
        match self.read_document().await {
            Err(StorageError::Serialization(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "store does not decode, overwriting it"
                );
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut raw = self.path.clone().into_os_string();
        raw.push(".tmp");
        PathBuf::from(raw)
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(document)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|err| StorageError::Connection(err.to_string()))?;
            }
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, raw)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut document = self.read_document().await?;
        document
            .remove(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn set<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value =
            serde_json::to_value(value).map_err(|err| StorageError::Serialization(err.to_string()))?;
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document_for_write().await?;
        document.insert(key.to_owned(), value);
        self.write_document(&document).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document_for_write().await?;
        document.remove(key);
        self.write_document(&document).await
    }
}

#[async_trait]
impl ProgressRepository for JsonFileRepository {
    async fn load_progress(&self) -> Result<Option<ProgressMap>, StorageError> {
        self.get(PROGRESS_KEY).await
    }

    async fn save_progress(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        tracing::debug!(path = %self.path.display(), levels = progress.len(), "saving progress");
        self.set(PROGRESS_KEY, progress).await
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        self.remove(PROGRESS_KEY).await
    }
}

#[async_trait]
impl StatsRepository for JsonFileRepository {
    async fn load_stats(&self) -> Result<Option<ActivityStats>, StorageError> {
        self.get(STATS_KEY).await
    }

    async fn save_stats(&self, stats: &ActivityStats) -> Result<(), StorageError> {
        self.set(STATS_KEY, stats).await
    }

    async fn clear_stats(&self) -> Result<(), StorageError> {
        self.remove(STATS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cakap_core::model::{LevelId, LevelProgress, LevelStatus};

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("store.json"));
        assert!(repo.load_progress().await.unwrap().is_none());
        assert!(repo.load_stats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn progress_is_stored_under_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let repo = JsonFileRepository::new(&path);

        let mut map = ProgressMap::new();
        map.insert(
            LevelId::new("beginner").unwrap(),
            LevelProgress::new(3, LevelStatus::Unlocked),
        );
        repo.save_progress(&map).await.unwrap();
        repo.save_stats(&ActivityStats::default()).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[PROGRESS_KEY]["beginner"]["completedLessons"], 3);
        assert_eq!(raw[PROGRESS_KEY]["beginner"]["status"], "unlocked");

        assert_eq!(repo.load_progress().await.unwrap(), Some(map));

        repo.clear_progress().await.unwrap();
        assert!(repo.load_progress().await.unwrap().is_none());
        assert!(repo.load_stats().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo = JsonFileRepository::new(path);
        let err = repo.load_progress().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn save_replaces_a_torn_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"cakapgo_progress": {"beginner": {"completedLe"#).unwrap();

        let repo = JsonFileRepository::new(&path);
        assert!(repo.load_progress().await.is_err());

        let mut map = ProgressMap::new();
        map.insert(
            LevelId::new("beginner").unwrap(),
            LevelProgress::new(1, LevelStatus::Unlocked),
        );
        repo.save_progress(&map).await.unwrap();
        repo.save_progress(&map).await.unwrap();

        assert_eq!(repo.load_progress().await.unwrap(), Some(map));
        assert!(repo.load_stats().await.unwrap().is_none());
        assert!(!dir.path().join("store.json.tmp").exists());
    }

    #[tokio::test]
    async fn clearing_a_torn_store_resets_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo = JsonFileRepository::new(&path);
        repo.clear_stats().await.unwrap();

        assert!(repo.load_progress().await.unwrap().is_none());
        assert!(repo.load_stats().await.unwrap().is_none());
    }
}

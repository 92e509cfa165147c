use async_trait::async_trait;
use cakap_core::model::{ActivityStats, ProgressMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistence contract for level progress.
///
/// The engine loads once at startup and hands back a full snapshot after
/// every completed lesson; backends store it as a flat key-value payload.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load the last saved progress.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or decoded.
    async fn load_progress(&self) -> Result<Option<ProgressMap>, StorageError>;

    /// Replace the saved progress with `progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be stored.
    async fn save_progress(&self, progress: &ProgressMap) -> Result<(), StorageError>;

    /// Forget saved progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_progress(&self) -> Result<(), StorageError>;
}

/// Persistence contract for learner activity stats.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Load saved stats, or `Ok(None)` when none exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or decoded.
    async fn load_stats(&self) -> Result<Option<ActivityStats>, StorageError>;

    /// Persist stats, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stats cannot be stored.
    async fn save_stats(&self, stats: &ActivityStats) -> Result<(), StorageError>;

    /// Forget saved stats.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear_stats(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<Option<ProgressMap>>>,
    stats: Arc<Mutex<Option<ActivityStats>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self) -> Result<Option<ProgressMap>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_progress(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(progress.clone());
        Ok(())
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl StatsRepository for InMemoryRepository {
    async fn load_stats(&self) -> Result<Option<ActivityStats>, StorageError> {
        let guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_stats(&self, stats: &ActivityStats) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(stats.clone());
        Ok(())
    }

    async fn clear_stats(&self) -> Result<(), StorageError> {
        let mut guard = self
            .stats
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub stats: Arc<dyn StatsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let stats: Arc<dyn StatsRepository> = Arc::new(repo);
        Self { progress, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cakap_core::model::{LevelId, LevelProgress, LevelStatus};
    use cakap_core::time::fixed_clock;

    fn progress(completed: u32) -> ProgressMap {
        let mut map = ProgressMap::new();
        map.insert(
            LevelId::new("beginner").unwrap(),
            LevelProgress::new(completed, LevelStatus::Unlocked),
        );
        map
    }

    #[tokio::test]
    async fn empty_repository_loads_nothing() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_progress().await.unwrap().is_none());
        assert!(repo.load_stats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_replaces_previous_progress() {
        let repo = InMemoryRepository::new();
        repo.save_progress(&progress(1)).await.unwrap();
        repo.save_progress(&progress(2)).await.unwrap();

        let loaded = repo.load_progress().await.unwrap().unwrap();
        assert_eq!(loaded["beginner"].completed_lessons, 2);

        repo.clear_progress().await.unwrap();
        assert!(repo.load_progress().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storage_handles_share_state() {
        let storage = Storage::in_memory();
        let mut stats = ActivityStats::default();
        stats.record_lesson(fixed_clock().today());
        storage.stats.save_stats(&stats).await.unwrap();

        let loaded = storage.stats.load_stats().await.unwrap();
        assert_eq!(loaded, Some(stats));
    }
}

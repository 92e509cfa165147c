use std::sync::Arc;

use cakap_core::model::{ActivityStats, Level, ProgressSnapshot};
use cakap_core::{Clock, Curriculum, LessonOutcome, LessonRef, ProgressionEngine};
use storage::repository::{ProgressRepository, StatsRepository};
use tracing::{debug, info, warn};

use crate::error::ProgressionServiceError;

/// Runs the progression engine against injected persistence.
///
/// Loads saved progress once, saves a snapshot after every lesson that
/// advances, and keeps the learner's activity stats in step. Mutating
/// methods take `&mut self`; hosts sharing a service across tasks must wrap
/// it in a mutex.
pub struct ProgressionService {
    clock: Clock,
    curriculum: Curriculum,
    engine: ProgressionEngine,
    progress: Arc<dyn ProgressRepository>,
    stats: Arc<dyn StatsRepository>,
}

impl ProgressionService {
    /// Build the engine from `curriculum` and whatever progress was saved.
    ///
    /// A failed load is logged and treated as "no saved progress".
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::Config` if the curriculum is malformed.
    pub async fn load(
        clock: Clock,
        curriculum: Curriculum,
        progress: Arc<dyn ProgressRepository>,
        stats: Arc<dyn StatsRepository>,
    ) -> Result<Self, ProgressionServiceError> {
        let restored = match progress.load_progress().await {
            Ok(restored) => restored,
            Err(err) => {
                warn!(error = %err, "failed to load saved progress, starting fresh");
                None
            }
        };

        let engine = ProgressionEngine::new(&curriculum, restored.as_ref())?;
        debug!(
            levels = engine.levels().len(),
            restored = restored.is_some(),
            "progression loaded"
        );

        Ok(Self {
            clock,
            curriculum,
            engine,
            progress,
            stats,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        self.engine.levels()
    }

    #[must_use]
    pub fn can_start(&self, level_id: &str) -> bool {
        self.engine.can_start(level_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.engine.snapshot()
    }

    /// The lesson to present for `level_id`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::Progression` if the level is locked,
    /// finished, or unknown.
    pub fn start_lesson(&self, level_id: &str) -> Result<LessonRef, ProgressionServiceError> {
        Ok(self.engine.start_lesson(level_id)?)
    }

    /// Complete the next lesson of `level_id` and persist the new snapshot.
    ///
    /// Nothing is saved when the level was already full.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::Progression` for locked or unknown
    /// levels, and `ProgressionServiceError::Storage` if saving fails. In the
    /// latter case the in-memory state has still advanced.
    pub async fn complete_lesson(
        &mut self,
        level_id: &str,
    ) -> Result<LessonOutcome, ProgressionServiceError> {
        let outcome = self.engine.complete_lesson(level_id)?;
        if !outcome.advanced {
            debug!(level = %outcome.level, "level already full, nothing to save");
            return Ok(outcome);
        }

        self.progress
            .save_progress(&self.engine.snapshot().to_progress_map())
            .await?;
        self.record_activity().await?;

        if outcome.just_completed {
            info!(level = %outcome.level, "level completed");
        } else {
            debug!(
                level = %outcome.level,
                completed = outcome.completed,
                remaining = outcome.remaining,
                "lesson completed"
            );
        }
        Ok(outcome)
    }

    /// Saved activity stats, or zeroed stats when none exist yet.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::Storage` if the stats cannot be read.
    pub async fn stats(&self) -> Result<ActivityStats, ProgressionServiceError> {
        Ok(self.stats.load_stats().await?.unwrap_or_default())
    }

    /// Forget all saved progress and stats and start over.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionServiceError::Storage` if clearing fails.
    pub async fn reset(&mut self) -> Result<(), ProgressionServiceError> {
        self.progress.clear_progress().await?;
        self.stats.clear_stats().await?;
        self.engine = ProgressionEngine::new(&self.curriculum, None)?;
        info!("progress reset");
        Ok(())
    }

    async fn record_activity(&self) -> Result<(), ProgressionServiceError> {
        let mut stats = self.stats.load_stats().await?.unwrap_or_default();
        stats.record_lesson(self.clock.today());
        self.stats.save_stats(&stats).await?;
        Ok(())
    }
}

use std::collections::HashSet;

use thiserror::Error;

use crate::curriculum::Curriculum;
use crate::model::{
    ConfigError, Level, LevelId, LevelSnapshot, LevelStatus, ProgressMap, ProgressSnapshot,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Recoverable errors from progression operations. No state is mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("level {level} is locked; complete {prerequisite} first")]
    Locked {
        level: LevelId,
        /// Display name of the level that must be completed first.
        prerequisite: String,
    },

    #[error("unknown level: {0}")]
    UnknownLevel(String),

    #[error("level {0} has no lessons left")]
    LevelFinished(LevelId),
}

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// The lesson to present when a level is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonRef {
    pub level: LevelId,
    /// Zero-based index, equal to the completed count.
    pub index: u32,
    pub title: String,
}

impl LessonRef {
    /// One-based lesson number for display.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.index + 1
    }
}

/// Result of `complete_lesson`, driving congratulation vs. remaining-count messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonOutcome {
    pub level: LevelId,
    pub level_name: String,
    pub completed: u32,
    pub total: u32,
    pub remaining: u32,
    /// The level reached `Completed` on this call.
    pub just_completed: bool,
    /// False when the level was already full and nothing changed.
    pub advanced: bool,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Owns the ordered levels and enforces unlock ordering.
///
/// Not internally synchronized: mutations take `&mut self`, so callers
/// sharing an engine must serialize access themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionEngine {
    levels: Vec<Level>,
}

impl ProgressionEngine {
    /// Build the engine from static configuration plus optional restored counts.
    ///
    /// Restored completed counts are clamped to each level's total and
    /// restored statuses are ignored; statuses are always re-derived. Unknown
    /// restored keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the curriculum is empty, any level is
    /// malformed, or ids repeat.
    pub fn new(
        curriculum: &Curriculum,
        restored: Option<&ProgressMap>,
    ) -> Result<Self, ConfigError> {
        if curriculum.levels().is_empty() {
            return Err(ConfigError::NoLevels);
        }

        let mut seen = HashSet::new();
        let mut levels = Vec::with_capacity(curriculum.levels().len());
        for config in curriculum.levels() {
            let mut level = config.clone().validate()?;
            if !seen.insert(level.id().clone()) {
                return Err(ConfigError::DuplicateId {
                    id: level.id().clone(),
                });
            }
            if let Some(saved) = restored.and_then(|map| map.get(level.id().as_str())) {
                level.set_completed(saved.completed_lessons);
            }
            levels.push(level);
        }

        let mut engine = Self { levels };
        engine.recompute_statuses();
        Ok(engine)
    }

    /// Re-derive every status from completion counts.
    pub fn recompute_statuses(&mut self) {
        recompute_statuses(&mut self.levels);
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[must_use]
    pub fn level(&self, id: &str) -> Option<&Level> {
        self.levels.iter().find(|level| level.id().as_str() == id)
    }

    /// True iff the level exists and is not locked.
    #[must_use]
    pub fn can_start(&self, id: &str) -> bool {
        self.level(id)
            .is_some_and(|level| level.status() != LevelStatus::Locked)
    }

    /// The lesson to present: progress resumes at the first incomplete lesson.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::Locked` for a locked level,
    /// `ProgressionError::LevelFinished` when every lesson is done, and
    /// `ProgressionError::UnknownLevel` for an unknown id.
    pub fn start_lesson(&self, id: &str) -> Result<LessonRef, ProgressionError> {
        let pos = self.position(id)?;
        self.ensure_unlocked(pos)?;

        let level = &self.levels[pos];
        let index = level.completed_lessons();
        let title = level
            .lesson_title(index)
            .ok_or_else(|| ProgressionError::LevelFinished(level.id().clone()))?;

        Ok(LessonRef {
            level: level.id().clone(),
            index,
            title: title.to_owned(),
        })
    }

    /// Mark the next lesson of a level as done.
    ///
    /// Completing a level that is already full is a no-op reported with
    /// `advanced == false`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionError::Locked` for a locked level and
    /// `ProgressionError::UnknownLevel` for an unknown id.
    pub fn complete_lesson(&mut self, id: &str) -> Result<LessonOutcome, ProgressionError> {
        let pos = self.position(id)?;
        self.ensure_unlocked(pos)?;

        let was_completed = self.levels[pos].status() == LevelStatus::Completed;
        let before = self.levels[pos].completed_lessons();
        self.levels[pos].set_completed(before.saturating_add(1));
        self.recompute_statuses();

        let level = &self.levels[pos];
        Ok(LessonOutcome {
            level: level.id().clone(),
            level_name: level.name().to_owned(),
            completed: level.completed_lessons(),
            total: level.total_lessons(),
            remaining: level.remaining(),
            just_completed: !was_completed && level.status() == LevelStatus::Completed,
            advanced: level.completed_lessons() != before,
        })
    }

    /// Immutable copy of every level's persisted fields.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::new(
            self.levels
                .iter()
                .map(|level| LevelSnapshot {
                    id: level.id().clone(),
                    completed: level.completed_lessons(),
                    total: level.total_lessons(),
                    status: level.status(),
                })
                .collect(),
        )
    }

    fn position(&self, id: &str) -> Result<usize, ProgressionError> {
        self.levels
            .iter()
            .position(|level| level.id().as_str() == id)
            .ok_or_else(|| ProgressionError::UnknownLevel(id.to_owned()))
    }

    fn ensure_unlocked(&self, pos: usize) -> Result<(), ProgressionError> {
        let level = &self.levels[pos];
        if level.status() != LevelStatus::Locked {
            return Ok(());
        }
        // Level 0 is never locked, so a predecessor exists.
        let prerequisite = pos
            .checked_sub(1)
            .map(|prev| self.levels[prev].name().to_owned())
            .unwrap_or_default();
        Err(ProgressionError::Locked {
            level: level.id().clone(),
            prerequisite,
        })
    }
}

/// Derive statuses over an ordered level sequence.
///
/// The first level is unlocked (or completed when full); every later level
/// stays locked until its predecessor is completed.
pub fn recompute_statuses(levels: &mut [Level]) {
    let mut previous_completed = true;
    for level in levels.iter_mut() {
        let status = if !previous_completed {
            LevelStatus::Locked
        } else if level.is_full() {
            LevelStatus::Completed
        } else {
            LevelStatus::Unlocked
        };
        level.set_status(status);
        previous_completed = status == LevelStatus::Completed;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::LevelId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Malformed static level configuration. Fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("curriculum must contain at least one level")]
    NoLevels,

    #[error("level id cannot be empty")]
    EmptyId,

    #[error("level {id} has an empty name")]
    EmptyName { id: LevelId },

    #[error("level {id} must contain at least one lesson")]
    NoLessons { id: LevelId },

    #[error("level {id} declares {declared} lessons but lists {listed} titles")]
    TitleCountMismatch {
        id: LevelId,
        declared: u32,
        listed: usize,
    },

    #[error("level id {id} is used more than once")]
    DuplicateId { id: LevelId },
}

/// Error returned when parsing an unknown status label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid level status: {0}")]
pub struct ParseStatusError(pub String);

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Gating state of a level.
///
/// Always derived from completion counts, never assigned by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStatus {
    /// The previous level is not completed yet.
    Locked,
    /// Playable, with lessons left.
    Unlocked,
    /// Every lesson is done. Terminal.
    Completed,
}

impl LevelStatus {
    /// Label used in persisted snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LevelStatus::Locked => "locked",
            LevelStatus::Unlocked => "unlocked",
            LevelStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for LevelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            "completed" => Ok(Self::Completed),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Static description of one level, as shipped with the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    pub id: String,
    pub name: String,
    pub total_lessons: u32,
    pub lesson_titles: Vec<String>,
}

impl LevelConfig {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        total_lessons: u32,
        lesson_titles: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total_lessons,
            lesson_titles,
        }
    }

    /// Validate the config into a fresh `Level` with no completed lessons.
    ///
    /// The returned level starts `Locked`; the engine derives the real status.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the id or name is blank, the level has no
    /// lessons, or the title count differs from `total_lessons`.
    pub fn validate(self) -> Result<Level, ConfigError> {
        let id = LevelId::new(self.id).map_err(|_| ConfigError::EmptyId)?;

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ConfigError::EmptyName { id });
        }
        if self.total_lessons == 0 {
            return Err(ConfigError::NoLessons { id });
        }
        let listed = self.lesson_titles.len();
        if usize::try_from(self.total_lessons).ok() != Some(listed) {
            return Err(ConfigError::TitleCountMismatch {
                id,
                declared: self.total_lessons,
                listed,
            });
        }

        Ok(Level {
            id,
            name,
            total_lessons: self.total_lessons,
            completed_lessons: 0,
            status: LevelStatus::Locked,
            lesson_titles: self.lesson_titles,
        })
    }
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// A difficulty tier and the learner's progress through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: LevelId,
    name: String,
    total_lessons: u32,
    completed_lessons: u32,
    status: LevelStatus,
    lesson_titles: Vec<String>,
}

impl Level {
    // Accessors
    #[must_use]
    pub fn id(&self) -> &LevelId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn total_lessons(&self) -> u32 {
        self.total_lessons
    }

    #[must_use]
    pub fn completed_lessons(&self) -> u32 {
        self.completed_lessons
    }

    #[must_use]
    pub fn status(&self) -> LevelStatus {
        self.status
    }

    #[must_use]
    pub fn lesson_titles(&self) -> &[String] {
        &self.lesson_titles
    }

    /// Title of the lesson at `index`, if it exists.
    #[must_use]
    pub fn lesson_title(&self, index: u32) -> Option<&str> {
        let index = usize::try_from(index).ok()?;
        self.lesson_titles.get(index).map(String::as_str)
    }

    /// Lessons left before the level is completed.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.total_lessons - self.completed_lessons
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.completed_lessons >= self.total_lessons
    }

    /// Completion as a percentage in `[0, 100]`, for progress bars.
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        f64::from(self.completed_lessons) / f64::from(self.total_lessons) * 100.0
    }

    pub(crate) fn set_completed(&mut self, completed: u32) {
        self.completed_lessons = completed.min(self.total_lessons);
    }

    pub(crate) fn set_status(&mut self, status: LevelStatus) {
        self.status = status;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Lesson {i}")).collect()
    }

    #[test]
    fn validate_happy_path() {
        let level = LevelConfig::new("beginner", " Beginner ", 3, titles(3))
            .validate()
            .unwrap();

        assert_eq!(level.id().as_str(), "beginner");
        assert_eq!(level.name(), "Beginner");
        assert_eq!(level.total_lessons(), 3);
        assert_eq!(level.completed_lessons(), 0);
        assert_eq!(level.remaining(), 3);
        assert_eq!(level.lesson_title(2), Some("Lesson 3"));
        assert_eq!(level.lesson_title(3), None);
    }

    #[test]
    fn validate_rejects_title_mismatch() {
        let err = LevelConfig::new("beginner", "Beginner", 4, titles(3))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TitleCountMismatch {
                declared: 4,
                listed: 3,
                ..
            }
        ));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let err = LevelConfig::new("  ", "Beginner", 1, titles(1))
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyId);

        let err = LevelConfig::new("beginner", "", 1, titles(1))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName { .. }));

        let err = LevelConfig::new("beginner", "Beginner", 0, Vec::new())
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoLessons { .. }));
    }

    #[test]
    fn set_completed_clamps_to_total() {
        let mut level = LevelConfig::new("beginner", "Beginner", 2, titles(2))
            .validate()
            .unwrap();
        level.set_completed(9);
        assert_eq!(level.completed_lessons(), 2);
        assert!(level.is_full());
        assert!((level.percent_complete() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn status_labels_parse_back() {
        for status in [
            LevelStatus::Locked,
            LevelStatus::Unlocked,
            LevelStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<LevelStatus>().unwrap(), status);
        }
        assert!("finished".parse::<LevelStatus>().is_err());
    }
}

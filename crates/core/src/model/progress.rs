use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::LevelId;
use crate::model::level::LevelStatus;

/// Persisted progress of a single level.
///
/// Field names follow the `cakapgo_progress` payload (`completedLessons`,
/// `status`). Restored records are read leniently: negative or missing counts
/// become 0 and unknown status labels become `locked`, since the engine
/// re-derives status anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    #[serde(default, deserialize_with = "lenient_count")]
    pub completed_lessons: u32,
    #[serde(default = "locked", deserialize_with = "lenient_status")]
    pub status: LevelStatus,
}

impl LevelProgress {
    #[must_use]
    pub fn new(completed_lessons: u32, status: LevelStatus) -> Self {
        Self {
            completed_lessons,
            status,
        }
    }
}

/// Flat level-id → progress mapping handed to the persistence collaborator.
pub type ProgressMap = BTreeMap<LevelId, LevelProgress>;

fn locked() -> LevelStatus {
    LevelStatus::Locked
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(raw.map_or(0, |v| u32::try_from(v.max(0)).unwrap_or(u32::MAX)))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<LevelStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|label| label.parse().ok())
        .unwrap_or(LevelStatus::Locked))
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Point-in-time copy of one level's persisted fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSnapshot {
    pub id: LevelId,
    pub completed: u32,
    pub total: u32,
    pub status: LevelStatus,
}

/// Immutable copy of every level, in curriculum order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    levels: Vec<LevelSnapshot>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new(levels: Vec<LevelSnapshot>) -> Self {
        Self { levels }
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelSnapshot] {
        &self.levels
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LevelSnapshot> {
        self.levels.iter().find(|level| level.id.as_str() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelSnapshot> {
        self.levels.iter()
    }

    /// Convert into the flat mapping saved by the persistence collaborator.
    #[must_use]
    pub fn to_progress_map(&self) -> ProgressMap {
        self.levels
            .iter()
            .map(|level| {
                (
                    level.id.clone(),
                    LevelProgress::new(level.completed, level.status),
                )
            })
            .collect()
    }
}

use cakap_core::model::{ActivityStats, LevelId, LevelProgress, LevelStatus};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Unknown labels map to `Locked`; the engine re-derives status on load.
pub(crate) fn parse_status(s: &str) -> LevelStatus {
    s.parse().unwrap_or(LevelStatus::Locked)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(LevelId, LevelProgress), StorageError> {
    let id: String = row.try_get("level_id").map_err(ser)?;
    let id = LevelId::new(id).map_err(ser)?;
    let completed = u32_from_i64(
        "completed_lessons",
        row.try_get::<i64, _>("completed_lessons").map_err(ser)?,
    )?;
    let status: String = row.try_get("status").map_err(ser)?;
    Ok((id, LevelProgress::new(completed, parse_status(&status))))
}

pub(crate) fn map_stats_row(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityStats, StorageError> {
    Ok(ActivityStats {
        lessons_completed: u32_from_i64(
            "lessons_completed",
            row.try_get::<i64, _>("lessons_completed").map_err(ser)?,
        )?,
        current_streak: u32_from_i64(
            "current_streak",
            row.try_get::<i64, _>("current_streak").map_err(ser)?,
        )?,
        total_points: u32_from_i64(
            "total_points",
            row.try_get::<i64, _>("total_points").map_err(ser)?,
        )?,
        last_activity: row.try_get("last_activity").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_falls_back_to_locked() {
        assert_eq!(parse_status("completed"), LevelStatus::Completed);
        assert_eq!(parse_status("unlocked"), LevelStatus::Unlocked);
        assert_eq!(parse_status("done"), LevelStatus::Locked);
    }
}

use async_trait::async_trait;
use cakap_core::model::ActivityStats;

use super::SqliteRepository;
use super::mapping::{conn, map_stats_row};
use crate::repository::{StatsRepository, StorageError};

#[async_trait]
impl StatsRepository for SqliteRepository {
    async fn load_stats(&self) -> Result<Option<ActivityStats>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT lessons_completed, current_streak, total_points, last_activity
            FROM activity_stats
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_stats_row).transpose()
    }

    async fn save_stats(&self, stats: &ActivityStats) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO activity_stats (
                id,
                lessons_completed,
                current_streak,
                total_points,
                last_activity
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                lessons_completed = excluded.lessons_completed,
                current_streak = excluded.current_streak,
                total_points = excluded.total_points,
                last_activity = excluded.last_activity
            ",
        )
        .bind(1_i64)
        .bind(i64::from(stats.lessons_completed))
        .bind(i64::from(stats.current_streak))
        .bind(i64::from(stats.total_points))
        .bind(stats.last_activity)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear_stats(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM activity_stats")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}

use async_trait::async_trait;
use cakap_core::model::ProgressMap;

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<Option<ProgressMap>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT level_id, completed_lessons, status
            FROM level_progress
            ORDER BY level_id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut progress = ProgressMap::new();
        for row in &rows {
            let (id, level) = map_progress_row(row)?;
            progress.insert(id, level);
        }
        Ok(Some(progress))
    }

    async fn save_progress(&self, progress: &ProgressMap) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // A snapshot replaces the whole payload.
        sqlx::query("DELETE FROM level_progress")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (id, level) in progress {
            sqlx::query(
                r"
                INSERT INTO level_progress (level_id, completed_lessons, status)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(id.as_str())
            .bind(i64::from(level.completed_lessons))
            .bind(level.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM level_progress")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}

use cakap_core::model::{ActivityStats, LevelId, LevelProgress, LevelStatus, ProgressMap};
use cakap_core::time::fixed_clock;
use storage::repository::{ProgressRepository, StatsRepository, Storage};
use storage::sqlite::SqliteRepository;

fn progress(entries: &[(&str, u32, LevelStatus)]) -> ProgressMap {
    entries
        .iter()
        .map(|(id, completed, status)| {
            (
                LevelId::new(*id).unwrap(),
                LevelProgress::new(*completed, *status),
            )
        })
        .collect()
}

#[tokio::test]
async fn sqlite_roundtrips_progress_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_progress().await.unwrap().is_none());

    let first = progress(&[
        ("beginner", 10, LevelStatus::Completed),
        ("intermediate", 2, LevelStatus::Unlocked),
        ("expert", 0, LevelStatus::Locked),
    ]);
    repo.save_progress(&first).await.unwrap();
    assert_eq!(repo.load_progress().await.unwrap(), Some(first));

    // A later snapshot replaces rows instead of merging.
    let second = progress(&[("beginner", 3, LevelStatus::Unlocked)]);
    repo.save_progress(&second).await.unwrap();
    assert_eq!(repo.load_progress().await.unwrap(), Some(second));

    repo.clear_progress().await.unwrap();
    assert!(repo.load_progress().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_upserts_single_stats_row() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_stats?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Migrations are idempotent.
    repo.migrate().await.expect("migrate twice");

    assert!(repo.load_stats().await.unwrap().is_none());

    let mut stats = ActivityStats::default();
    stats.record_lesson(fixed_clock().today());
    repo.save_stats(&stats).await.unwrap();
    stats.record_lesson(fixed_clock().today());
    repo.save_stats(&stats).await.unwrap();

    let loaded = repo.load_stats().await.unwrap().expect("stats saved");
    assert_eq!(loaded, stats);
    assert_eq!(loaded.lessons_completed, 2);

    repo.clear_stats().await.unwrap();
    assert!(repo.load_stats().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_storage_exposes_both_repositories() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");

    let map = progress(&[("beginner", 1, LevelStatus::Unlocked)]);
    storage.progress.save_progress(&map).await.unwrap();
    assert_eq!(storage.progress.load_progress().await.unwrap(), Some(map));
    assert!(storage.stats.load_stats().await.unwrap().is_none());
}

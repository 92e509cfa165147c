use std::sync::Arc;

use cakap_core::model::LevelStatus;
use cakap_core::time::fixed_now;
use cakap_core::{Curriculum, ProgressionError};
use services::{Clock, ProgressionService, ProgressionServiceError};
use storage::JsonFileRepository;
use storage::repository::{InMemoryRepository, ProgressRepository};

async fn load(repo: &InMemoryRepository, clock: Clock) -> ProgressionService {
    ProgressionService::load(
        clock,
        Curriculum::standard(),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
    .await
    .unwrap()
}

fn status(svc: &ProgressionService, id: &str) -> LevelStatus {
    svc.snapshot().get(id).unwrap().status
}

#[tokio::test]
async fn finishing_beginner_unlocks_intermediate_and_survives_reload() {
    let repo = InMemoryRepository::new();
    let mut svc = load(&repo, Clock::fixed(fixed_now())).await;

    for i in 1..=10 {
        let lesson = svc.start_lesson("beginner").unwrap();
        assert_eq!(lesson.index, i - 1);
        let outcome = svc.complete_lesson("beginner").await.unwrap();
        assert_eq!(outcome.just_completed, i == 10);
    }

    assert_eq!(status(&svc, "beginner"), LevelStatus::Completed);
    assert_eq!(status(&svc, "intermediate"), LevelStatus::Unlocked);
    assert_eq!(status(&svc, "expert"), LevelStatus::Locked);

    let err = svc.start_lesson("expert").unwrap_err();
    assert!(matches!(
        err,
        ProgressionServiceError::Progression(ProgressionError::Locked { ref prerequisite, .. })
            if prerequisite == "Intermediate"
    ));

    let reloaded = load(&repo, Clock::fixed(fixed_now())).await;
    assert_eq!(reloaded.snapshot(), svc.snapshot());
    assert_eq!(
        reloaded.start_lesson("intermediate").unwrap().title,
        "Past Tense Verbs"
    );
}

#[tokio::test]
async fn restored_status_is_not_trusted() {
    let repo = InMemoryRepository::new();
    let payload = r#"{
        "beginner": {"completedLessons": 10, "status": "unlocked"},
        "expert": {"completedLessons": 3, "status": "completed"},
        "legacy": {"completedLessons": 7, "status": "completed"}
    }"#;
    repo.save_progress(&serde_json::from_str(payload).unwrap())
        .await
        .unwrap();

    let svc = load(&repo, Clock::fixed(fixed_now())).await;

    assert_eq!(status(&svc, "beginner"), LevelStatus::Completed);
    assert_eq!(status(&svc, "intermediate"), LevelStatus::Unlocked);
    assert_eq!(status(&svc, "expert"), LevelStatus::Locked);
    assert!(svc.snapshot().get("legacy").is_none());
}

#[tokio::test]
async fn streak_follows_the_clock() {
    let repo = InMemoryRepository::new();
    let mut clock = Clock::fixed(fixed_now());

    let mut svc = load(&repo, clock).await;
    svc.complete_lesson("beginner").await.unwrap();

    clock.advance(chrono::Duration::days(1));
    let mut svc = load(&repo, clock).await;
    svc.complete_lesson("beginner").await.unwrap();

    let stats = svc.stats().await.unwrap();
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.lessons_completed, 2);
}

#[tokio::test]
async fn torn_json_store_recovers_on_next_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"cakapgo_progress": {"beginner": {"completedLe"#).unwrap();

    let repo = Arc::new(JsonFileRepository::new(&path));
    let mut svc = ProgressionService::load(
        Clock::fixed(fixed_now()),
        Curriculum::standard(),
        repo.clone(),
        repo.clone(),
    )
    .await
    .unwrap();

    for _ in 0..3 {
        svc.complete_lesson("beginner").await.unwrap();
    }

    let saved = repo.load_progress().await.unwrap().unwrap();
    assert_eq!(saved["beginner"].completed_lessons, 3);
    assert_eq!(svc.stats().await.unwrap().lessons_completed, 3);
}

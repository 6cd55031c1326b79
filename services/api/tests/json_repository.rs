use api_lib::adapters::JsonFileRepository;
use chrono::Utc;
use workout_tracker_core::{
    domain::WorkoutSnapshot,
    ports::WorkoutRepository,
    routines::sample_routine,
    store::WorkoutStore,
};

#[tokio::test]
async fn missing_file_loads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path().join("workouts.json"));
    assert_eq!(repository.load().await.unwrap(), WorkoutSnapshot::default());
}

#[tokio::test]
async fn saved_snapshot_survives_a_new_repository() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("workouts.json");

    let mut store = WorkoutStore::new();
    store.seed_sample_routine();
    let routine_id = store.routines()[0].id;
    store.start_routine(routine_id, Utc::now()).unwrap();
    store.finish_session(Utc::now()).unwrap();

    JsonFileRepository::new(&path)
        .save(&store.snapshot())
        .await
        .unwrap();

    let loaded = JsonFileRepository::new(&path).load().await.unwrap();
    assert_eq!(loaded, store.snapshot());
    assert_eq!(loaded.routines[0].name, sample_routine().name);
    assert!(loaded.routines[0].last_performed.is_some());
    assert!(!path.with_file_name("workouts.json.tmp").exists());
}

#[tokio::test]
async fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");
    std::fs::write(&path, b"{ not json").unwrap();

    assert!(JsonFileRepository::new(&path).load().await.is_err());
}

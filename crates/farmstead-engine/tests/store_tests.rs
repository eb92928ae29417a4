//! File store tests: save, backup rotation, fallback and integrity.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use farmstead_engine::prelude::*;

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// A save path unique to this test run.
fn scratch_path(name: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "farmstead-{}-{}-{}.json",
        name,
        std::process::id(),
        n
    ))
}

fn cleanup(store: &JsonFileStore) {
    let _ = fs::remove_file(store.path());
    let _ = fs::remove_file(store.backup_path());
}

fn state(gold: u64) -> GameState {
    let mut state = GameState::new_game(&Tunables::default(), 1_700_000_000);
    state.player.gold = gold;
    state.inventory.add(&ItemId::from("tomato_seed"), 10);
    state
}

#[test]
fn missing_file_loads_as_none() {
    let store = JsonFileStore::new(scratch_path("missing"));
    assert!(store.load_state().unwrap().is_none());
}

#[test]
fn save_then_load_round_trips() {
    let mut store = JsonFileStore::new(scratch_path("roundtrip"));
    store.save_state(&state(42)).unwrap();

    assert_eq!(store.load_state().unwrap(), Some(state(42)));
    assert!(!store.backup_path().exists());
    cleanup(&store);
}

#[test]
fn second_save_keeps_the_first_as_backup() {
    let mut store = JsonFileStore::new(scratch_path("backup"));
    store.save_state(&state(1)).unwrap();
    store.save_state(&state(2)).unwrap();

    let backup = JsonFileStore::new(store.backup_path());
    assert_eq!(backup.load_state().unwrap(), Some(state(1)));
    assert_eq!(store.load_state().unwrap(), Some(state(2)));
    cleanup(&store);
}

#[test]
fn corrupt_main_file_falls_back_to_backup() {
    let mut store = JsonFileStore::new(scratch_path("fallback"));
    store.save_state(&state(1)).unwrap();
    store.save_state(&state(2)).unwrap();
    fs::write(store.path(), b"{ truncated").unwrap();

    assert_eq!(store.load_state().unwrap(), Some(state(1)));
    cleanup(&store);
}

#[test]
fn corrupt_main_without_backup_is_an_error() {
    let store = JsonFileStore::new(scratch_path("corrupt"));
    fs::write(store.path(), b"{ truncated").unwrap();

    assert!(matches!(store.load_state(), Err(StoreError::Json(_))));
    cleanup(&store);
}

#[test]
fn hand_edited_save_fails_the_integrity_check() {
    let mut store = JsonFileStore::new(scratch_path("edited"));
    store.save_state(&state(10)).unwrap();

    let text = fs::read_to_string(store.path()).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
    value["state"]["player"]["gold"] = serde_json::json!(1_000_000);
    fs::write(store.path(), serde_json::to_vec(&value).unwrap()).unwrap();

    assert!(matches!(
        store.load_state(),
        Err(StoreError::IntegrityMismatch { .. })
    ));
    cleanup(&store);
}

#[test]
fn corrupt_save_is_not_rotated_into_the_backup() {
    let mut store = JsonFileStore::new(scratch_path("rotation"));
    store.save_state(&state(1)).unwrap();
    store.save_state(&state(2)).unwrap();
    fs::write(store.path(), b"garbage").unwrap();

    store.save_state(&state(3)).unwrap();
    let backup = JsonFileStore::new(store.backup_path());
    assert_eq!(backup.load_state().unwrap(), Some(state(1)));
    cleanup(&store);
}

#[test]
fn farm_session_survives_a_restart() {
    let mut store = JsonFileStore::new(scratch_path("session"));
    let mut farm = Farm::new_game(StaticCatalog::default(), 100);
    farm.hire_worker().unwrap();
    farm.save(&mut store, 200).unwrap();

    let (farm, outcome) = Farm::load_or_new(&store, StaticCatalog::default(), 230);
    assert!(matches!(outcome, LoadOutcome::Restored { ref report, .. } if report.entity_updates == 30));
    assert_eq!(farm.workers().count(), 2);
    assert_eq!(farm.gold(), 500);
    assert_eq!(farm.state().last_update_epoch, 230);
    cleanup(&store);
}

// tests/cache_test.rs — Integration test: persistent cache round-trips (SQLite)

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use wkcache::api::types::Kanji;
use wkcache::cache::{Cache, ManualClock, SqliteStore};
use wkcache::collection::{CacheableCollection, Collection};
use wkcache::infra::config::{CacheConfig, Config};

const HOUR: Duration = Duration::from_secs(3600);

fn sqlite_config(dir: &tempfile::TempDir) -> CacheConfig {
    CacheConfig {
        max_age_hours: 2,
        persistent: true,
        path: Some(dir.path().join("nested").join("cache.db")),
    }
}

#[test]
fn test_entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&dir);

    {
        let cache = Cache::open(&config);
        assert_eq!(cache.store_kind(), "sqlite");
        assert!(cache.is_persistent());
        let scope = cache.root().child("user/KEY");
        scope.set("study_queue", &json!({ "lessons_available": 3 }));
        scope.set("info", &json!({ "username": "koichi" }));
    }

    let cache = Cache::open(&config);
    let scope = cache.root().child("user/KEY");
    let queue: serde_json::Value = scope.get("study_queue").unwrap();
    assert_eq!(queue["lessons_available"], 3);
    let mut keys = scope.keys("");
    keys.sort();
    assert_eq!(keys, vec!["info".to_string(), "study_queue".to_string()]);
}

#[test]
fn test_collection_dump_and_load_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&dir);

    let items = vec![
        Kanji {
            character: "山".into(),
            meaning: "mountain".into(),
            level: 1,
            ..Default::default()
        },
        Kanji {
            character: "川".into(),
            meaning: "river".into(),
            level: 1,
            ..Default::default()
        },
    ];
    Collection::from_items(items).dump(&Cache::open(&config).root().child("user/KEY"));

    let mut loaded: Collection<Kanji> = Collection::new();
    loaded.load(&Cache::open(&config).root().child("user/KEY"));
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.by_primary("川").unwrap().meaning, "river");
}

#[test]
fn test_stale_sweep_on_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0));
    let store = SqliteStore::open(&dir.path().join("cache.db")).unwrap();
    let cache = Cache::with_clock(Box::new(store), HOUR, clock.clone());
    let root = cache.root();

    root.set("old", &1);
    clock.advance(Duration::from_secs(45 * 60));
    root.set("new", &2);
    clock.advance(Duration::from_secs(20 * 60));

    assert_eq!(root.remove_stale(""), 1);
    assert!(!root.has("old"));
    assert_eq!(root.get::<i32>("new"), Some(2));
}

#[test]
fn test_unopenable_path_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the database file should be.
    let blocker = dir.path().join("cache.db");
    std::fs::create_dir_all(&blocker).unwrap();
    let config = CacheConfig {
        path: Some(blocker),
        ..Default::default()
    };

    let cache = Cache::open(&config);
    assert_eq!(cache.store_kind(), "memory");
    cache.root().set("k", &"v");
    assert_eq!(cache.root().get::<String>("k").as_deref(), Some("v"));
}

#[test]
fn test_uncreatable_parent_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the cache directory should go.
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();
    let config = CacheConfig {
        path: Some(file.join("cache.db")),
        ..Default::default()
    };

    let cache = Cache::open(&config);
    assert_eq!(cache.store_kind(), "memory");
    cache.root().set("k", &1);
    assert!(cache.root().has("k"));
}

#[test]
fn test_non_persistent_config() {
    let config = CacheConfig {
        persistent: false,
        ..Default::default()
    };
    let cache = Cache::open(&config);
    assert!(!cache.is_persistent());
    assert_eq!(cache.max_age(), 2 * HOUR);
}

#[test]
fn test_config_file_drives_cache() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("wk.db");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[cache]\nmax_age_hours = 6\npath = {:?}\n\n[api]\napi_version = \"v1.2\"\n",
            db.display().to_string()
        ),
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.api.api_version, "v1.2");
    let cache = Cache::open(&config.cache);
    assert_eq!(cache.max_age(), 6 * HOUR);
    cache.root().set("x", &1);
    assert!(db.exists());
}

// src/cache/mod.rs — Timestamped key-value cache
//
// Every value is stored as `{"created": <epoch ms>, "data": <json>}`. An
// entry is fresh while `now < created + max_age`; stale entries are treated
// as absent and dropped on read. There is no background sweep: bulk cleanup
// goes through `remove_stale`.
//
// Prefix matching is a plain string prefix test, not segment-aware, so a
// prefix of "rad" also matches "radicals/...".

pub mod clock;
pub mod scope;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scope::Scope;
pub use store::{KvStore, MemoryStore, SqliteStore};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::infra::config::CacheConfig;
use crate::infra::errors::WkError;
use clock::duration_millis;

/// Namespace every key lives under.
pub const ROOT_NAMESPACE: &str = "wanikani";

/// Two hours; matches `CacheConfig::default()`.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct Entry<T> {
    created: i64,
    data: T,
}

struct CacheState {
    store: Box<dyn KvStore>,
    max_age: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheState {
    fn is_fresh(&self, created: i64) -> bool {
        let now = self.clock.now_millis();
        now < created.saturating_add(duration_millis(self.max_age))
    }

    /// Run `op` against the store. A failing persistent store is swapped for
    /// an empty in-memory one and the operation retried there.
    fn with_store<R: Default>(
        &mut self,
        op: impl Fn(&mut dyn KvStore) -> Result<R, WkError>,
    ) -> R {
        match op(self.store.as_mut()) {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    "Cache store '{}' failed ({e}); using in-memory cache for this process",
                    self.store.kind()
                );
                self.store = Box::new(MemoryStore::new());
                op(self.store.as_mut()).unwrap_or_default()
            }
        }
    }

    /// Decode the entry at `key`, evicting it when stale or unreadable.
    fn read(&mut self, key: &str) -> Option<serde_json::Value> {
        let raw = self.with_store(|s| s.get(key))?;
        match serde_json::from_str::<Entry<serde_json::Value>>(&raw) {
            Ok(entry) if self.is_fresh(entry.created) => Some(entry.data),
            Ok(_) => {
                debug!("Cache entry '{key}' expired");
                self.with_store(|s| s.delete(key));
                None
            }
            Err(e) => {
                debug!("Dropping unreadable cache entry '{key}': {e}");
                self.with_store(|s| s.delete(key));
                None
            }
        }
    }

    fn is_stale_or_unreadable(&mut self, key: &str) -> bool {
        let Some(raw) = self.with_store(|s| s.get(key)) else {
            return false;
        };
        match serde_json::from_str::<Entry<serde_json::Value>>(&raw) {
            Ok(entry) => !self.is_fresh(entry.created),
            Err(_) => true,
        }
    }

    fn keys_with_prefix(&mut self, prefix: &str) -> Vec<String> {
        self.with_store(|s| s.keys())
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }
}

/// Shared handle to the cache. Clones refer to the same entries.
#[derive(Clone)]
pub struct Cache {
    state: Arc<Mutex<CacheState>>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Cache")
            .field("store", &state.store.kind())
            .field("max_age", &state.max_age)
            .finish()
    }
}

impl Cache {
    pub fn new(store: Box<dyn KvStore>, max_age: Duration) -> Self {
        Self::with_clock(store, max_age, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Box<dyn KvStore>, max_age: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                store,
                max_age,
                clock,
            })),
        }
    }

    pub fn in_memory(max_age: Duration) -> Self {
        Self::new(Box::new(MemoryStore::new()), max_age)
    }

    /// Open the configured cache. Falls back to memory when the database
    /// cannot be opened.
    pub fn open(config: &CacheConfig) -> Self {
        if !config.persistent {
            return Self::in_memory(config.max_age());
        }
        let path = config.db_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                debug!("Cannot create cache directory {}: {e}", parent.display());
            }
        }
        match SqliteStore::open(&path) {
            Ok(store) => {
                debug!("Opened cache at {}", path.display());
                Self::new(Box::new(store), config.max_age())
            }
            Err(e) => {
                warn!(
                    "Cannot open cache at {} ({e}); using in-memory cache",
                    path.display()
                );
                Self::in_memory(config.max_age())
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Scope rooted at the `wanikani` namespace.
    pub fn root(&self) -> Scope {
        Scope::new(self.clone(), ROOT_NAMESPACE)
    }

    /// Scope rooted at an arbitrary namespace.
    pub fn scope(&self, namespace: &str) -> Scope {
        Scope::new(self.clone(), namespace)
    }

    pub fn is_persistent(&self) -> bool {
        self.state().store.kind() != "memory"
    }

    pub fn store_kind(&self) -> &'static str {
        self.state().store.kind()
    }

    pub fn max_age(&self) -> Duration {
        self.state().max_age
    }

    pub fn set_max_age(&self, max_age: Duration) {
        self.state().max_age = max_age;
    }

    /// Run `f` with a temporary max age. The previous value comes back on
    /// every exit path, unwinding included.
    pub fn with_max_age<R>(&self, max_age: Duration, f: impl FnOnce() -> R) -> R {
        let _guard = MaxAgeGuard::install(self, max_age);
        f()
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let mut state = self.state();
        let entry = Entry {
            created: state.clock.now_millis(),
            data: value,
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => state.with_store(|s| s.set(key, &raw)),
            Err(e) => warn!("Cannot serialize cache value for '{key}': {e}"),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.state().read(key)?;
        match serde_json::from_value(data) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Cache entry '{key}' has unexpected shape: {e}");
                None
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.state().read(key).is_some()
    }

    pub fn remove(&self, key: &str) {
        self.state().with_store(|s| s.delete(key));
    }

    /// Delete every entry under `prefix`, fresh or not. Returns the count.
    pub fn remove_prefix(&self, prefix: &str) -> usize {
        let mut state = self.state();
        let keys = state.keys_with_prefix(prefix);
        for key in &keys {
            state.with_store(|s| s.delete(key));
        }
        debug!("Removed {} cache entries under '{prefix}'", keys.len());
        keys.len()
    }

    /// Same as `remove_prefix`.
    pub fn clear(&self, prefix: &str) -> usize {
        self.remove_prefix(prefix)
    }

    /// Delete expired entries under `prefix`. Returns the count.
    pub fn remove_stale(&self, prefix: &str) -> usize {
        let mut state = self.state();
        let mut removed = 0;
        for key in state.keys_with_prefix(prefix) {
            if state.is_stale_or_unreadable(&key) {
                state.with_store(|s| s.delete(&key));
                removed += 1;
            }
        }
        debug!("Removed {removed} stale cache entries under '{prefix}'");
        removed
    }

    /// Fresh keys under `prefix`, with the prefix stripped.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        let mut state = self.state();
        state
            .keys_with_prefix(prefix)
            .into_iter()
            .filter(|k| state.read(k).is_some())
            .map(|k| k[prefix.len()..].to_string())
            .collect()
    }

    /// Fresh entries under `prefix`, keyed by suffix. Entries that do not
    /// decode as `T` are skipped.
    pub fn to_mapping<T: DeserializeOwned>(&self, prefix: &str) -> BTreeMap<String, T> {
        let mut state = self.state();
        let mut out = BTreeMap::new();
        for key in state.keys_with_prefix(prefix) {
            if let Some(data) = state.read(&key) {
                if let Ok(value) = serde_json::from_value(data) {
                    out.insert(key[prefix.len()..].to_string(), value);
                }
            }
        }
        out
    }
}

/// Restores the previous max age when dropped.
struct MaxAgeGuard<'a> {
    cache: &'a Cache,
    previous: Duration,
}

impl<'a> MaxAgeGuard<'a> {
    fn install(cache: &'a Cache, max_age: Duration) -> Self {
        let previous = {
            let mut state = cache.state();
            std::mem::replace(&mut state.max_age, max_age)
        };
        Self { cache, previous }
    }
}

impl Drop for MaxAgeGuard<'_> {
    fn drop(&mut self) {
        self.cache.set_max_age(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn manual_cache(max_age: Duration) -> (Cache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = Cache::with_clock(Box::new(MemoryStore::new()), max_age, clock.clone());
        (cache, clock)
    }

    /// Fails every call, like a database whose file vanished.
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, WkError> {
            Err(WkError::Config("disk gone".into()))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), WkError> {
            Err(WkError::Config("disk gone".into()))
        }
        fn delete(&mut self, _key: &str) -> Result<(), WkError> {
            Err(WkError::Config("disk gone".into()))
        }
        fn keys(&self) -> Result<Vec<String>, WkError> {
            Err(WkError::Config("disk gone".into()))
        }
        fn kind(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("k", &42u32);

        clock.advance(HOUR - Duration::from_millis(1));
        assert_eq!(cache.get::<u32>("k"), Some(42));
        assert!(cache.has("k"));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get::<u32>("k"), None);
        assert!(!cache.has("k"));
    }

    #[test]
    fn test_stale_read_evicts_entry() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("k", "v");
        clock.advance(HOUR * 2);
        assert_eq!(cache.get::<String>("k"), None);

        // Even a wider window cannot bring it back: it was deleted.
        cache.with_max_age(HOUR * 10, || {
            assert_eq!(cache.get::<String>("k"), None);
        });
    }

    #[test]
    fn test_set_overwrites_and_restamps() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("k", &1u32);
        clock.advance(HOUR / 2);
        cache.set("k", &2u32);
        clock.advance(HOUR / 2 + Duration::from_secs(1));
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let (cache, _) = manual_cache(HOUR);
        cache.remove("nothing");
        cache.set("a", &1u32);
        cache.remove("a");
        assert!(!cache.has("a"));
    }

    #[test]
    fn test_remove_prefix_isolation() {
        let (cache, _) = manual_cache(HOUR);
        cache.set("wanikani/user/a/info", &1u32);
        cache.set("wanikani/user/a/radicals/x", &2u32);
        cache.set("wanikani/user/b/info", &3u32);
        cache.set("other", &4u32);

        assert_eq!(cache.remove_prefix("wanikani/user/a/"), 2);
        assert!(!cache.has("wanikani/user/a/info"));
        assert!(!cache.has("wanikani/user/a/radicals/x"));
        assert!(cache.has("wanikani/user/b/info"));
        assert!(cache.has("other"));
    }

    #[test]
    fn test_remove_prefix_ignores_freshness() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("p/old", &1u32);
        clock.advance(HOUR * 2);
        cache.set("p/new", &2u32);
        assert_eq!(cache.remove_prefix("p/"), 2);
    }

    #[test]
    fn test_prefix_match_is_not_segment_aware() {
        let (cache, _) = manual_cache(HOUR);
        cache.set("user/ab/info", &1u32);
        cache.set("user/abc/info", &2u32);

        // "user/ab" is a literal prefix of "user/abc/..." too.
        assert_eq!(cache.remove_prefix("user/ab"), 2);
        assert!(!cache.has("user/abc/info"));
    }

    #[test]
    fn test_remove_stale_keeps_fresh() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("p/old", &1u32);
        clock.advance(HOUR);
        cache.set("p/new", &2u32);
        cache.set("q/old", &3u32);
        clock.advance(Duration::from_secs(1));

        assert_eq!(cache.remove_stale("p/"), 1);
        assert_eq!(cache.get::<u32>("p/new"), Some(2));
        assert!(cache.state().with_store(|s| s.get("p/old")).is_none());
    }

    #[test]
    fn test_remove_stale_leaves_other_prefixes() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("p/old", &1u32);
        cache.set("q/old", &2u32);
        clock.advance(HOUR * 2);

        assert_eq!(cache.remove_stale("p/"), 1);
        // Untouched by the sweep, still physically present.
        assert!(cache.state().with_store(|s| s.get("q/old")).is_some());
    }

    #[test]
    fn test_keys_and_mapping_strip_prefix_and_skip_stale() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("p/old", &1u32);
        clock.advance(HOUR);
        cache.set("p/a", &2u32);
        cache.set("p/b", &3u32);
        cache.set("x/c", &4u32);

        let mut keys = cache.keys("p/");
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        let mapping: BTreeMap<String, u32> = cache.to_mapping("p/");
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["a"], 2);
        assert_eq!(mapping["b"], 3);
    }

    #[test]
    fn test_with_max_age_restores_after_return() {
        let (cache, _) = manual_cache(HOUR);
        let out = cache.with_max_age(Duration::from_secs(5), || cache.max_age());
        assert_eq!(out, Duration::from_secs(5));
        assert_eq!(cache.max_age(), HOUR);
    }

    #[test]
    fn test_with_max_age_restores_after_error() {
        let (cache, _) = manual_cache(HOUR);
        let result: Result<(), WkError> = cache.with_max_age(Duration::ZERO, || {
            Err(WkError::Config("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(cache.max_age(), HOUR);
    }

    #[test]
    fn test_with_max_age_restores_after_panic() {
        let (cache, _) = manual_cache(HOUR);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.with_max_age(Duration::ZERO, || panic!("inside scoped max age"))
        }));
        assert!(outcome.is_err());
        assert_eq!(cache.max_age(), HOUR);
        // Lock was not held during the panic, so the cache still works.
        cache.set("k", &1u32);
        assert_eq!(cache.get::<u32>("k"), Some(1));
    }

    #[test]
    fn test_nested_with_max_age() {
        let (cache, clock) = manual_cache(HOUR);
        cache.set("k", &1u32);
        clock.advance(Duration::from_secs(10));
        cache.with_max_age(Duration::from_secs(60), || {
            cache.with_max_age(Duration::from_secs(5), || {
                assert!(!cache.has("k"));
            });
            assert_eq!(cache.max_age(), Duration::from_secs(60));
        });
        assert_eq!(cache.max_age(), HOUR);
    }

    #[test]
    fn test_values_are_copies() {
        let (cache, _) = manual_cache(HOUR);
        cache.set("v", &vec![1u32, 2, 3]);
        let mut first: Vec<u32> = cache.get("v").unwrap();
        first.push(4);
        let second: Vec<u32> = cache.get("v").unwrap();
        assert_eq!(second, vec![1, 2, 3]);
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let (cache, _) = manual_cache(HOUR);
        cache.set("k", "text");
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn test_broken_store_falls_back_to_memory() {
        let cache = Cache::new(Box::new(BrokenStore), HOUR);
        assert_eq!(cache.store_kind(), "broken");

        cache.set("k", &7u32);
        assert_eq!(cache.store_kind(), "memory");
        assert!(!cache.is_persistent());
        assert_eq!(cache.get::<u32>("k"), Some(7));
        assert_eq!(cache.keys(""), vec!["k".to_string()]);
    }

    #[test]
    fn test_broken_store_read_degrades_to_absent() {
        let cache = Cache::new(Box::new(BrokenStore), HOUR);
        assert_eq!(cache.get::<u32>("k"), None);
        assert_eq!(cache.remove_prefix(""), 0);
    }

    #[test]
    fn test_open_non_persistent_is_memory() {
        let config = CacheConfig {
            persistent: false,
            ..Default::default()
        };
        let cache = Cache::open(&config);
        assert!(!cache.is_persistent());
        assert_eq!(cache.max_age(), DEFAULT_MAX_AGE);
    }

    #[test]
    fn test_open_persistent_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            path: Some(dir.path().join("nested").join("cache.db")),
            max_age_hours: 24,
            ..Default::default()
        };
        let cache = Cache::open(&config);
        assert!(cache.is_persistent());
        assert_eq!(cache.max_age(), Duration::from_secs(86_400));
        cache.set("k", "v");
        assert_eq!(cache.get::<String>("k").as_deref(), Some("v"));
    }
}

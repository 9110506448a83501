// src/cache/scope.rs — Prefix-scoped view of the cache

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Cache;

/// A cache view with a fixed key prefix.
///
/// `key("x")` is `<base>/x` and `key("")` is `<base>/`, so enumerating or
/// removing with an empty prefix covers everything inside the scope.
#[derive(Clone, Debug)]
pub struct Scope {
    cache: Cache,
    base: String,
}

impl Scope {
    pub fn new(cache: Cache, base: impl Into<String>) -> Self {
        Self {
            cache,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Full key for `sub` inside this scope.
    pub fn key(&self, sub: &str) -> String {
        format!("{}/{}", self.base, sub)
    }

    /// Nested scope: `<base>/<sub>`.
    pub fn child(&self, sub: &str) -> Scope {
        Scope::new(self.cache.clone(), self.key(sub))
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.cache.set(&self.key(key), value);
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.get(&self.key(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.cache.has(&self.key(key))
    }

    pub fn remove(&self, key: &str) {
        self.cache.remove(&self.key(key));
    }

    pub fn remove_prefix(&self, prefix: &str) -> usize {
        self.cache.remove_prefix(&self.key(prefix))
    }

    pub fn remove_stale(&self, prefix: &str) -> usize {
        self.cache.remove_stale(&self.key(prefix))
    }

    /// Same as `remove_prefix`.
    pub fn clear(&self, prefix: &str) -> usize {
        self.remove_prefix(prefix)
    }

    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.cache.keys(&self.key(prefix))
    }

    pub fn to_mapping<T: DeserializeOwned>(&self, prefix: &str) -> BTreeMap<String, T> {
        self.cache.to_mapping(&self.key(prefix))
    }

    pub fn with_max_age<R>(&self, max_age: Duration, f: impl FnOnce(&Scope) -> R) -> R {
        self.cache.with_max_age(max_age, || f(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStore};
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn root() -> (Scope, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Cache::with_clock(Box::new(MemoryStore::new()), HOUR, clock.clone());
        (cache.root(), clock)
    }

    #[test]
    fn test_keys_are_prefixed() {
        let (root, _) = root();
        assert_eq!(root.key("info"), "wanikani/info");
        assert_eq!(root.key(""), "wanikani/");

        let user = root.child("user/abc");
        assert_eq!(user.base(), "wanikani/user/abc");
        assert_eq!(user.child("kanji").key("日"), "wanikani/user/abc/kanji/日");
    }

    #[test]
    fn test_child_writes_visible_from_parent() {
        let (root, _) = root();
        let user = root.child("user/abc");
        user.set("info", &5u32);
        assert_eq!(root.get::<u32>("user/abc/info"), Some(5));
        assert_eq!(root.cache().get::<u32>("wanikani/user/abc/info"), Some(5));
    }

    #[test]
    fn test_empty_prefix_clears_whole_scope() {
        let (root, _) = root();
        let a = root.child("user/a");
        let b = root.child("user/b");
        a.set("info", &1u32);
        a.child("radicals").set("一", &2u32);
        b.set("info", &3u32);

        assert_eq!(a.remove_prefix(""), 2);
        assert!(a.keys("").is_empty());
        assert!(b.has("info"));
    }

    #[test]
    fn test_clear_matches_remove_prefix() {
        let (root, _) = root();
        let user = root.child("user/a");
        user.set("x1", &1u32);
        user.set("x2", &2u32);
        user.set("y", &3u32);
        assert_eq!(user.clear("x"), 2);
        assert_eq!(user.keys(""), vec!["y".to_string()]);
    }

    #[test]
    fn test_mapping_within_child() {
        let (root, _) = root();
        let kanji = root.child("user/a").child("kanji");
        kanji.set("日", "sun");
        kanji.set("月", "moon");
        let mapping: BTreeMap<String, String> = kanji.to_mapping("");
        assert_eq!(mapping.get("日").map(String::as_str), Some("sun"));
        assert_eq!(mapping.get("月").map(String::as_str), Some("moon"));
    }

    #[test]
    fn test_scoped_max_age_sweep() {
        let (root, clock) = root();
        let user = root.child("user/a");
        user.set("old", &1u32);
        clock.advance(Duration::from_secs(120));
        user.set("new", &2u32);

        let removed = user.with_max_age(Duration::from_secs(60), |s| s.remove_stale(""));
        assert_eq!(removed, 1);
        assert_eq!(root.cache().max_age(), HOUR);
        assert!(user.has("new"));
        assert!(!user.has("old"));
    }

    #[test]
    fn test_sibling_prefix_wrinkle() {
        let (root, _) = root();
        let user = root.child("user/a");
        user.set("radicals/一", &1u32);
        user.set("radiant", &2u32);
        // Literal prefix "rad" reaches both keys.
        let mut keys = user.keys("rad");
        keys.sort();
        assert_eq!(keys, vec!["iant".to_string(), "icals/一".to_string()]);
    }
}

// src/collection/mod.rs — Identity-keyed item collections
//
// Incoming items are upserted: a matching identity is overwritten in place,
// anything new is appended, then the whole collection is re-sorted (stable,
// ascending level unless a custom order is set). Applying the same batch
// twice leaves the collection unchanged.

pub mod coverage;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::types::{CriticalItem, ItemKind, Kanji, Radical, RecentUnlock, Vocabulary};
use crate::cache::Scope;
pub use coverage::{CoverageRule, FetchPlan};

/// Identity used to match an incoming item against a cached one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub primary: String,
    /// Set when one collection mixes several item kinds.
    pub kind: Option<ItemKind>,
}

impl Identity {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            kind: None,
        }
    }

    pub fn with_kind(primary: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            primary: primary.into(),
            kind: Some(kind),
        }
    }

    /// Cache key suffix for the item's entry.
    pub fn cache_key(&self) -> String {
        match self.kind {
            Some(kind) => format!("{}:{}", kind.as_str(), self.primary),
            None => self.primary.clone(),
        }
    }
}

/// An item that can live in a `Collection`.
pub trait CacheableItem: Clone + Serialize + DeserializeOwned {
    /// Child scope name the collection is cached under.
    const COLLECTION: &'static str;
    /// How request arguments map onto cached items.
    const COVERAGE: CoverageRule;

    fn identity(&self) -> Identity;
    fn level(&self) -> u32;

    /// Tracked correct-answer percentage, for threshold-indexed collections.
    fn percentage(&self) -> Option<u32> {
        None
    }
}

/// Behaviour shared by every cached collection.
pub trait CacheableCollection {
    type Item: CacheableItem;

    fn cache_key(&self) -> &'static str;
    fn merge(&mut self, incoming: Vec<Self::Item>);
    fn plan(&self, args: &[u32], user_level: Option<u32>) -> FetchPlan;
    fn dump(&self, scope: &Scope);
    fn load(&mut self, scope: &Scope);
}

pub type Order<T> = fn(&T, &T) -> Ordering;

fn by_level<T: CacheableItem>(a: &T, b: &T) -> Ordering {
    a.level().cmp(&b.level())
}

#[derive(Debug, Clone)]
pub struct Collection<T: CacheableItem> {
    items: Vec<T>,
    order: Order<T>,
}

impl<T: CacheableItem> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CacheableItem> Collection<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            order: by_level::<T>,
        }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        let mut c = Self::new();
        c.merge(items);
        c
    }

    /// Replace the ordering applied after each merge and re-sort now.
    pub fn with_order(mut self, order: Order<T>) -> Self {
        self.order = order;
        self.sort();
        self
    }

    pub fn sort(&mut self) {
        self.items.sort_by(self.order);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the items with the fresh entries stored under `scope`.
    pub fn reload(&mut self, scope: &Scope) {
        self.items.clear();
        self.load(scope);
    }

    pub fn get(&self, identity: &Identity) -> Option<&T> {
        self.items.iter().find(|i| &i.identity() == identity)
    }

    /// First item whose primary identity matches, regardless of kind.
    pub fn by_primary(&self, primary: &str) -> Option<&T> {
        self.items.iter().find(|i| i.identity().primary == primary)
    }

    pub fn has_level(&self, level: u32) -> bool {
        self.items.iter().any(|i| i.level() == level)
    }

    /// Items whose level is one of `levels`.
    pub fn at_levels(&self, levels: &[u32]) -> Vec<&T> {
        self.items
            .iter()
            .filter(|i| levels.contains(&i.level()))
            .collect()
    }

    pub fn max_percentage(&self) -> Option<u32> {
        self.items.iter().filter_map(|i| i.percentage()).max()
    }
}

impl<T: CacheableItem> CacheableCollection for Collection<T> {
    type Item = T;

    fn cache_key(&self) -> &'static str {
        T::COLLECTION
    }

    fn merge(&mut self, incoming: Vec<T>) {
        let mut index: HashMap<Identity, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(pos, item)| (item.identity(), pos))
            .collect();

        for item in incoming {
            match index.get(&item.identity()) {
                Some(&pos) => self.items[pos] = item,
                None => {
                    index.insert(item.identity(), self.items.len());
                    self.items.push(item);
                }
            }
        }
        self.sort();
    }

    fn plan(&self, args: &[u32], user_level: Option<u32>) -> FetchPlan {
        T::COVERAGE.plan(self, args, user_level)
    }

    /// One entry per item under `<scope>/<collection>/<identity>`.
    fn dump(&self, scope: &Scope) {
        let child = scope.child(T::COLLECTION);
        for item in &self.items {
            child.set(&item.identity().cache_key(), item);
        }
    }

    fn load(&mut self, scope: &Scope) {
        let stored = scope.child(T::COLLECTION).to_mapping::<T>("");
        self.merge(stored.into_values().collect());
    }
}

// ---------------------------------------------------------------------------
// Item implementations
// ---------------------------------------------------------------------------

impl CacheableItem for Radical {
    const COLLECTION: &'static str = "radicals";
    const COVERAGE: CoverageRule = CoverageRule::Levels;

    fn identity(&self) -> Identity {
        // Image-only radicals have no character; their meaning is unique.
        if self.character.is_empty() {
            Identity::new(self.meaning.clone())
        } else {
            Identity::new(self.character.clone())
        }
    }

    fn level(&self) -> u32 {
        self.level
    }
}

impl CacheableItem for Kanji {
    const COLLECTION: &'static str = "kanji";
    const COVERAGE: CoverageRule = CoverageRule::Levels;

    fn identity(&self) -> Identity {
        Identity::new(self.character.clone())
    }

    fn level(&self) -> u32 {
        self.level
    }
}

impl CacheableItem for Vocabulary {
    const COLLECTION: &'static str = "vocabulary";
    const COVERAGE: CoverageRule = CoverageRule::Levels;

    fn identity(&self) -> Identity {
        Identity::new(self.character.clone())
    }

    fn level(&self) -> u32 {
        self.level
    }
}

impl CacheableItem for RecentUnlock {
    const COLLECTION: &'static str = "recent_unlocks";
    const COVERAGE: CoverageRule = CoverageRule::Limit {
        default: 10,
        min: 1,
        max: 100,
    };

    fn identity(&self) -> Identity {
        let primary = if self.character.is_empty() {
            &self.meaning
        } else {
            &self.character
        };
        Identity::with_kind(primary.clone(), self.kind)
    }

    fn level(&self) -> u32 {
        self.level
    }
}

impl CacheableItem for CriticalItem {
    const COLLECTION: &'static str = "critical_items";
    const COVERAGE: CoverageRule = CoverageRule::Threshold {
        default: 75,
        min: 0,
        max: 100,
    };

    fn identity(&self) -> Identity {
        let primary = if self.character.is_empty() {
            &self.meaning
        } else {
            &self.character
        };
        Identity::with_kind(primary.clone(), self.kind)
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn percentage(&self) -> Option<u32> {
        Some(self.percentage)
    }
}

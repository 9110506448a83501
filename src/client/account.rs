// src/client/account.rs — One API key's cached view of the remote account
//
// Every operation first asks whether cached state already answers it. Only
// when it does not is a request issued, with the arguments narrowed to what
// is actually missing. Responses are merged, persisted, and the account's
// user information is refreshed from the envelope.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{
    user_namespace, INFO_KEY, LEVEL_PROGRESSION_KEY, SRS_DISTRIBUTION_KEY, STUDY_QUEUE_KEY,
};
use crate::api::decode::{self, Envelope};
use crate::api::types::{
    CriticalItem, Kanji, LevelProgression, Radical, RecentUnlock, SrsDistribution, StudyQueue,
    UserInformation, Vocabulary,
};
use crate::api::{Resource, ResourcePath, Transport};
use crate::cache::{Cache, Scope};
use crate::collection::{CacheableCollection, CacheableItem, Collection, CoverageRule, FetchPlan};
use crate::infra::errors::WkError;

type Decoder<T> = fn(Envelope) -> Result<T, WkError>;

/// Newest unlock first; undated items last.
fn newest_first(a: &RecentUnlock, b: &RecentUnlock) -> Ordering {
    b.unlocked_date
        .unwrap_or(i64::MIN)
        .cmp(&a.unlocked_date.unwrap_or(i64::MIN))
}

/// Lowest correct-answer percentage first.
fn most_critical_first(a: &CriticalItem, b: &CriticalItem) -> Ordering {
    a.percentage.cmp(&b.percentage).then(a.level.cmp(&b.level))
}

// ---------------------------------------------------------------------------
// Session: credentials, transport, scope and user information
// ---------------------------------------------------------------------------

struct Session {
    api_key: String,
    transport: Arc<dyn Transport>,
    scope: Scope,
    info: Option<UserInformation>,
}

impl Session {
    fn user_level(&self) -> Option<u32> {
        self.info.as_ref().map(|i| i.level).filter(|l| *l > 0)
    }

    /// Forget info the cache no longer holds as fresh.
    fn expire_info(&mut self) {
        if self.info.is_some() && !self.scope.has(INFO_KEY) {
            tracing::debug!("Cached user information expired");
            self.info = None;
        }
    }

    fn store_info(&mut self, info: UserInformation) {
        self.scope.set(INFO_KEY, &info);
        self.info = Some(info);
    }

    /// Fetch, split the envelope, decode the payload, then refresh info.
    async fn request<T>(
        &mut self,
        resource: Resource,
        args: Vec<u32>,
        decoder: Decoder<T>,
    ) -> Result<T, WkError> {
        let path = ResourcePath::new(self.api_key.clone(), resource, args);
        let raw = self.transport.fetch(&path).await?;
        let envelope = decode::envelope(resource, raw)?;
        let info = envelope.user_information.clone();
        let value = decoder(envelope)?;
        if let Some(info) = info {
            self.store_info(info);
        }
        Ok(value)
    }

    /// Cached single value, or fetch and persist it under `key`.
    async fn single<T>(
        &mut self,
        slot: &mut Option<T>,
        key: &str,
        resource: Resource,
        decoder: Decoder<T>,
    ) -> Result<T, WkError>
    where
        T: Clone + Serialize,
    {
        self.expire_info();
        if slot.is_some() && !self.scope.has(key) {
            *slot = None;
        }
        if let Some(value) = slot {
            tracing::debug!("Shortcut: {resource} served from cache");
            return Ok(value.clone());
        }
        let value = self.request(resource, Vec::new(), decoder).await?;
        self.scope.set(key, &value);
        *slot = Some(value.clone());
        Ok(value)
    }

    /// Bring `collection` up to date for `args`.
    async fn sync<T: CacheableItem>(
        &mut self,
        collection: &mut Collection<T>,
        resource: Resource,
        args: &[u32],
        decoder: Decoder<Vec<T>>,
    ) -> Result<(), WkError> {
        self.expire_info();
        collection.reload(&self.scope);
        match collection.plan(args, self.user_level()) {
            FetchPlan::Shortcut => {
                tracing::debug!("Shortcut: {resource} {args:?} served from cache");
                Ok(())
            }
            FetchPlan::Fetch(narrowed) => {
                tracing::debug!("Fetching {resource} for {narrowed:?}");
                let items = self.request(resource, narrowed, decoder).await?;
                collection.merge(items);
                collection.dump(&self.scope);
                Ok(())
            }
        }
    }
}

fn load_single<T: DeserializeOwned>(scope: &Scope, key: &str) -> Option<T> {
    scope.get(key)
}

fn load_collection<T: CacheableItem>(scope: &Scope, mut collection: Collection<T>) -> Collection<T> {
    collection.load(scope);
    collection
}

fn clamped(arg: Option<u32>, rule: CoverageRule) -> u32 {
    match rule {
        CoverageRule::Limit { default, min, max } | CoverageRule::Threshold { default, min, max } => {
            arg.unwrap_or(default).clamp(min, max)
        }
        CoverageRule::Levels => arg.unwrap_or(0),
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

pub struct Account {
    session: Session,
    study_queue: Option<StudyQueue>,
    level_progression: Option<LevelProgression>,
    srs_distribution: Option<SrsDistribution>,
    recent_unlocks: Collection<RecentUnlock>,
    critical_items: Collection<CriticalItem>,
    radicals: Collection<Radical>,
    kanji: Collection<Kanji>,
    vocabulary: Collection<Vocabulary>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The API key is a credential; only the username is shown.
        f.debug_struct("Account")
            .field("user", &self.session.info.as_ref().map(|i| i.username.as_str()))
            .field("radicals", &self.radicals.len())
            .field("kanji", &self.kanji.len())
            .field("vocabulary", &self.vocabulary.len())
            .finish()
    }
}

impl Account {
    /// Create the account and load whatever the cache still holds for it.
    pub fn new(api_key: &str, cache: &Cache, transport: Arc<dyn Transport>) -> Result<Self, WkError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(WkError::NoApiKey);
        }
        let scope = cache.root().child(&user_namespace(api_key));
        let mut account = Self {
            session: Session {
                api_key: api_key.to_string(),
                transport,
                scope,
                info: None,
            },
            study_queue: None,
            level_progression: None,
            srs_distribution: None,
            recent_unlocks: Collection::new(),
            critical_items: Collection::new(),
            radicals: Collection::new(),
            kanji: Collection::new(),
            vocabulary: Collection::new(),
        };
        account.reload();
        Ok(account)
    }

    /// Replace in-memory state with what the cache holds now.
    pub fn reload(&mut self) {
        let scope = self.session.scope.clone();
        self.session.info = load_single(&scope, INFO_KEY);
        self.study_queue = load_single(&scope, STUDY_QUEUE_KEY);
        self.level_progression = load_single(&scope, LEVEL_PROGRESSION_KEY);
        self.srs_distribution = load_single(&scope, SRS_DISTRIBUTION_KEY);
        self.recent_unlocks =
            load_collection(&scope, Collection::<RecentUnlock>::new().with_order(newest_first));
        self.critical_items = load_collection(
            &scope,
            Collection::<CriticalItem>::new().with_order(most_critical_first),
        );
        self.radicals = load_collection(&scope, Collection::new());
        self.kanji = load_collection(&scope, Collection::new());
        self.vocabulary = load_collection(&scope, Collection::new());
        tracing::debug!(
            "Loaded account from cache: info={} radicals={} kanji={} vocabulary={}",
            self.session.info.is_some(),
            self.radicals.len(),
            self.kanji.len(),
            self.vocabulary.len()
        );
    }

    pub fn api_key(&self) -> &str {
        &self.session.api_key
    }

    pub fn scope(&self) -> &Scope {
        &self.session.scope
    }

    // --- Cached state ------------------------------------------------------

    pub fn info(&self) -> Option<&UserInformation> {
        self.session.info.as_ref()
    }

    pub fn user_level(&self) -> Option<u32> {
        self.session.user_level()
    }

    pub fn cached_study_queue(&self) -> Option<&StudyQueue> {
        self.study_queue.as_ref()
    }

    pub fn cached_level_progression(&self) -> Option<&LevelProgression> {
        self.level_progression.as_ref()
    }

    pub fn cached_srs_distribution(&self) -> Option<&SrsDistribution> {
        self.srs_distribution.as_ref()
    }

    pub fn cached_recent_unlocks(&self) -> &Collection<RecentUnlock> {
        &self.recent_unlocks
    }

    pub fn cached_critical_items(&self) -> &Collection<CriticalItem> {
        &self.critical_items
    }

    pub fn cached_radicals(&self) -> &Collection<Radical> {
        &self.radicals
    }

    pub fn cached_kanji(&self) -> &Collection<Kanji> {
        &self.kanji
    }

    pub fn cached_vocabulary(&self) -> &Collection<Vocabulary> {
        &self.vocabulary
    }

    /// Levels a level-indexed request resolves to. Empty means "all cached".
    fn effective_levels(&self, requested: &[u32]) -> Vec<u32> {
        if !requested.is_empty() {
            return requested.to_vec();
        }
        match self.user_level() {
            Some(level) => (1..=level).collect(),
            None => Vec::new(),
        }
    }

    fn level_view<T: CacheableItem>(&self, collection: &Collection<T>, requested: &[u32]) -> Vec<T> {
        let levels = self.effective_levels(requested);
        if levels.is_empty() {
            return collection.to_vec();
        }
        collection.at_levels(&levels).into_iter().cloned().collect()
    }

    // --- Remote operations -------------------------------------------------

    pub async fn user_information(&mut self) -> Result<UserInformation, WkError> {
        self.session.expire_info();
        if let Some(info) = &self.session.info {
            tracing::debug!("Shortcut: user-information served from cache");
            return Ok(info.clone());
        }
        self.session
            .request(Resource::UserInformation, Vec::new(), decode::user_information)
            .await
    }

    pub async fn study_queue(&mut self) -> Result<StudyQueue, WkError> {
        self.session
            .single(
                &mut self.study_queue,
                STUDY_QUEUE_KEY,
                Resource::StudyQueue,
                decode::study_queue,
            )
            .await
    }

    pub async fn level_progression(&mut self) -> Result<LevelProgression, WkError> {
        self.session
            .single(
                &mut self.level_progression,
                LEVEL_PROGRESSION_KEY,
                Resource::LevelProgression,
                decode::level_progression,
            )
            .await
    }

    pub async fn srs_distribution(&mut self) -> Result<SrsDistribution, WkError> {
        self.session
            .single(
                &mut self.srs_distribution,
                SRS_DISTRIBUTION_KEY,
                Resource::SrsDistribution,
                decode::srs_distribution,
            )
            .await
    }

    /// The `limit` newest unlocks (default 10, clamped to 1..=100).
    pub async fn recent_unlocks(&mut self, limit: Option<u32>) -> Result<Vec<RecentUnlock>, WkError> {
        let args: Vec<u32> = limit.into_iter().collect();
        self.session
            .sync(
                &mut self.recent_unlocks,
                Resource::RecentUnlocks,
                &args,
                decode::recent_unlocks,
            )
            .await?;
        let n = clamped(limit, RecentUnlock::COVERAGE) as usize;
        Ok(self.recent_unlocks.items().iter().take(n).cloned().collect())
    }

    /// All cached critical items, most critical first.
    pub async fn critical_items(&mut self, threshold: Option<u32>) -> Result<Vec<CriticalItem>, WkError> {
        let args: Vec<u32> = threshold.into_iter().collect();
        self.session
            .sync(
                &mut self.critical_items,
                Resource::CriticalItems,
                &args,
                decode::critical_items,
            )
            .await?;
        Ok(self.critical_items.to_vec())
    }

    pub async fn radicals(&mut self, levels: &[u32]) -> Result<Vec<Radical>, WkError> {
        self.session
            .sync(&mut self.radicals, Resource::Radicals, levels, decode::radicals)
            .await?;
        Ok(self.level_view(&self.radicals, levels))
    }

    pub async fn kanji(&mut self, levels: &[u32]) -> Result<Vec<Kanji>, WkError> {
        self.session
            .sync(&mut self.kanji, Resource::Kanji, levels, decode::kanji)
            .await?;
        Ok(self.level_view(&self.kanji, levels))
    }

    pub async fn vocabulary(&mut self, levels: &[u32]) -> Result<Vec<Vocabulary>, WkError> {
        self.session
            .sync(&mut self.vocabulary, Resource::Vocabulary, levels, decode::vocabulary)
            .await?;
        Ok(self.level_view(&self.vocabulary, levels))
    }

    // --- Cache maintenance -------------------------------------------------

    /// Drop everything cached for this account, persisted and in memory.
    pub fn clear(&mut self) -> usize {
        let removed = self.session.scope.clear("");
        self.reload();
        removed
    }

    /// Evict stale entries, optionally judged by a one-off `max_age`, then
    /// reload in-memory state from what survived.
    pub fn ensure_fresh(&mut self, max_age: Option<Duration>) -> usize {
        let removed = match max_age {
            Some(age) => self.session.scope.with_max_age(age, |s| s.remove_stale("")),
            None => self.session.scope.remove_stale(""),
        };
        self.reload();
        removed
    }
}

// src/client/registry.rs — Explicit owner of active accounts

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use super::{user_namespace, Account};
use crate::api::Transport;
use crate::cache::Cache;
use crate::infra::errors::WkError;

/// Accounts keyed by API key. The host creates one and passes it around.
pub struct Registry {
    cache: Cache,
    transport: Arc<dyn Transport>,
    accounts: HashMap<String, Account>,
}

impl Registry {
    pub fn new(cache: Cache, transport: Arc<dyn Transport>) -> Self {
        Self {
            cache,
            transport,
            accounts: HashMap::new(),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Get the account for `api_key`, creating it from cache on first use.
    pub fn account(&mut self, api_key: &str) -> Result<&mut Account, WkError> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(WkError::NoApiKey);
        }
        match self.accounts.entry(key.to_string()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let account = Account::new(key, &self.cache, self.transport.clone())?;
                Ok(slot.insert(account))
            }
        }
    }

    pub fn get(&self, api_key: &str) -> Option<&Account> {
        self.accounts.get(api_key.trim())
    }

    pub fn contains(&self, api_key: &str) -> bool {
        self.accounts.contains_key(api_key.trim())
    }

    /// Drop the account and everything cached for it. Returns the number of
    /// cache entries removed.
    pub fn forget(&mut self, api_key: &str) -> usize {
        let key = api_key.trim();
        self.accounts.remove(key);
        if key.is_empty() {
            return 0;
        }
        self.cache.root().child(&user_namespace(key)).clear("")
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResourcePath;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn fetch(&self, _path: &ResourcePath) -> Result<serde_json::Value, WkError> {
            Err(WkError::Transport {
                message: "offline".into(),
                retriable: true,
            })
        }
    }

    fn registry() -> Registry {
        Registry::new(Cache::in_memory(Duration::from_secs(3600)), Arc::new(Offline))
    }

    #[test]
    fn test_account_is_created_once() {
        let mut r = registry();
        assert!(r.is_empty());
        r.account("a").unwrap();
        r.account(" a ").unwrap();
        r.account("b").unwrap();
        assert_eq!(r.len(), 2);
        assert!(r.contains("a"));
    }

    #[test]
    fn test_existing_account_is_reused() {
        let mut r = registry();
        assert!(r.account("a").unwrap().info().is_none());

        // A rebuilt account would pick this up; the stored one does not.
        let cache = r.cache().clone();
        cache
            .root()
            .child("user/a")
            .set("info", &serde_json::json!({ "username": "later", "level": 5 }));
        assert!(r.account(" a ").unwrap().info().is_none());
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let mut r = registry();
        assert!(matches!(r.account(""), Err(WkError::NoApiKey)));
        assert!(r.is_empty());
    }

    #[test]
    fn test_forget_clears_only_that_namespace() {
        let mut r = registry();
        let cache = r.cache().clone();
        cache.root().child("user/a").set("info", &1);
        cache.root().child("user/ab").set("info", &2);
        r.account("a").unwrap();

        assert_eq!(r.forget("a"), 1);
        assert!(!r.contains("a"));
        assert!(!cache.root().child("user/a").has("info"));
        assert!(cache.root().child("user/ab").has("info"));
    }
}

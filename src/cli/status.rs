// src/cli/status.rs — Cache and config status display

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ResourcePath, Transport};
use crate::cache::Cache;
use crate::client::Account;
use crate::infra::config::Config;
use crate::infra::errors::WkError;
use crate::infra::paths;

/// Status never touches the network.
struct NoNetwork;

#[async_trait]
impl Transport for NoNetwork {
    async fn fetch(&self, path: &ResourcePath) -> Result<serde_json::Value, WkError> {
        Err(WkError::Transport {
            message: format!("status does not fetch {}", path.resource),
            retriable: false,
        })
    }
}

pub fn status_lines(config: &Config, cache: &Cache, api_key: Option<&str>) -> Vec<String> {
    let config_path = paths::config_file_path();
    let mut lines = vec![
        format!("wkcache v{}", env!("CARGO_PKG_VERSION")),
        String::new(),
    ];

    if config_path.exists() {
        lines.push(format!("  Config:     {} (loaded)", config_path.display()));
    } else {
        lines.push("  Config:     (using defaults)".into());
    }
    lines.push(format!(
        "  API:        {} ({})",
        config.api.base_url, config.api.api_version
    ));

    if cache.is_persistent() {
        lines.push(format!(
            "  Cache:      {} ({})",
            config.cache.db_path().display(),
            cache.store_kind()
        ));
    } else {
        lines.push(format!("  Cache:      ({})", cache.store_kind()));
    }
    lines.push(format!(
        "  Max age:    {}h",
        cache.max_age().as_secs() / 3600
    ));
    lines.push(format!("  Entries:    {} fresh", cache.root().keys("").len()));

    let Some(key) = api_key else {
        lines.push("  API key:    (not set)".into());
        return lines;
    };
    lines.push("  API key:    set".into());

    match Account::new(key, cache, Arc::new(NoNetwork)) {
        Ok(account) => {
            let user = account
                .info()
                .map(|i| format!("{} (level {})", i.username, i.level))
                .unwrap_or_else(|| "(not cached)".into());
            lines.push(String::new());
            lines.push(format!("  Account:    {user}"));
            lines.push(format!(
                "    Radicals:   {}",
                account.cached_radicals().len()
            ));
            lines.push(format!("    Kanji:      {}", account.cached_kanji().len()));
            lines.push(format!(
                "    Vocabulary: {}",
                account.cached_vocabulary().len()
            ));
            lines.push(format!(
                "    Recent:     {}",
                account.cached_recent_unlocks().len()
            ));
            lines.push(format!(
                "    Critical:   {}",
                account.cached_critical_items().len()
            ));
        }
        Err(e) => lines.push(format!("  Account:    {e}")),
    }
    lines
}

pub fn show_status(config: &Config, cache: &Cache, api_key: Option<&str>) {
    for line in status_lines(config, cache, api_key) {
        println!("{line}");
    }
}

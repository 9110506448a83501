// src/cli/commands.rs — Subcommand dispatch

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::status;
use super::text::TextRenderer;
use super::{Cli, Commands};
use crate::api::transport::HttpTransport;
use crate::cache::Cache;
use crate::client::Registry;
use crate::deferred::Deferred;
use crate::infra::config::Config;
use crate::infra::errors::WkError;
use crate::render::{self, Renderer, SiteLinks};

/// Settle a handle from `fut` with `renderer` attached. True on success.
async fn deliver<T, R>(
    fut: impl Future<Output = Result<T, WkError>>,
    renderer: &Arc<R>,
) -> bool
where
    T: 'static,
    R: Renderer<T> + 'static,
{
    let handle = Deferred::new();
    let attached: Arc<dyn Renderer<T>> = renderer.clone();
    render::attach(&handle, attached);
    handle.settle_from(fut).await;
    handle.is_resolved()
}

/// Run one account command. Returns false when the request failed; the
/// failure has already been reported through the renderer.
pub async fn execute(
    registry: &mut Registry,
    api_key: &str,
    command: &Commands,
    renderer: &Arc<TextRenderer>,
) -> Result<bool, WkError> {
    let account = registry.account(api_key)?;
    let ok = match command {
        Commands::Info => deliver(account.user_information(), renderer).await,
        Commands::Queue => deliver(account.study_queue(), renderer).await,
        Commands::Progress => deliver(account.level_progression(), renderer).await,
        Commands::Srs => deliver(account.srs_distribution(), renderer).await,
        Commands::Recent { limit } => deliver(account.recent_unlocks(*limit), renderer).await,
        Commands::Critical { threshold } => {
            deliver(account.critical_items(*threshold), renderer).await
        }
        Commands::Radicals { levels } => deliver(account.radicals(levels), renderer).await,
        Commands::Kanji { levels } => deliver(account.kanji(levels), renderer).await,
        Commands::Vocab { levels } => deliver(account.vocabulary(levels), renderer).await,
        Commands::Clear => {
            let removed = account.clear();
            renderer.line(&format!("Removed {removed} cached entries."));
            true
        }
        Commands::Prune { max_age_hours } => {
            let max_age = max_age_hours.map(|h| Duration::from_secs(h.saturating_mul(3600)));
            let removed = account.ensure_fresh(max_age);
            renderer.line(&format!("Removed {removed} stale entries."));
            true
        }
        Commands::Status => {
            tracing::debug!("status is handled without an account");
            true
        }
    };
    Ok(ok)
}

/// Entry point for the binary. Returns false when a request failed.
pub async fn run(cli: &Cli, config: &Config) -> anyhow::Result<bool> {
    let cache = Cache::open(&config.cache);
    let api_key = config.resolve_api_key(cli.api_key.as_deref());

    if !cli.command.needs_account() {
        status::show_status(config, &cache, api_key.as_deref().ok());
        return Ok(true);
    }

    let api_key = api_key?;
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let renderer = Arc::new(TextRenderer::stdout(SiteLinks::from_config(&config.api)?));
    let mut registry = Registry::new(cache, transport);

    Ok(execute(&mut registry, &api_key, &cli.command, &renderer).await?)
}

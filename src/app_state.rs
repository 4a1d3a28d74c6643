use std::path::Path;
use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{
        CredentialProvider, Navigator, Notifier, PageRemote, RemoteClient, SnapshotCache, SnapshotCacheConfig,
        SqliteSnapshotBackend, StaticCredentials,
    },
    schemas::registry,
    services::{IdentitySwitcher, PageController},
};

/// Everything a session needs, wired from configuration
#[derive(Clone)]
pub struct AppState {
    pub switcher: Arc<IdentitySwitcher>,
    pub controller: Arc<PageController>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config, notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> anyhow::Result<Self> {
        ensure_cache_dir(&config.cache.url)?;

        // Persistent snapshot cache
        let backend = SqliteSnapshotBackend::connect(&config.cache.url).await?;
        let cache = Arc::new(SnapshotCache::new(
            Arc::new(backend),
            SnapshotCacheConfig {
                l1_max_entries: config.cache.capacity,
            },
        ));

        // Remote page service
        let credentials: Arc<dyn CredentialProvider> = Arc::new(StaticCredentials::new(config.remote.token.clone()));
        let remote: Arc<dyn PageRemote> = Arc::new(RemoteClient::new(&config.remote, credentials)?);

        let controller = Arc::new(PageController::new(registry(), remote.clone(), cache, notifier.clone()));
        let switcher = Arc::new(IdentitySwitcher::new(controller.clone(), remote, notifier, navigator));

        Ok(Self {
            switcher,
            controller,
            config,
        })
    }
}

/// SQLite creates the file but not its directory
fn ensure_cache_dir(url: &str) -> anyhow::Result<()> {
    let path = url.trim_start_matches("sqlite:").trim_start_matches("//");
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Bearer token; absent means anonymous calls
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl RemoteConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: 10_000,
            token: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub url: String,
    pub capacity: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = env::var("PAGES_API_URL").unwrap_or_else(|_| "http://localhost:3000/api".to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            anyhow::bail!("PAGES_API_URL must be an http(s) URL, got {}", base_url);
        }

        Ok(Self {
            remote: RemoteConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                timeout_ms: env::var("PAGES_API_TIMEOUT_MS")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .unwrap_or(10_000),
                token: env::var("PAGES_API_TOKEN").ok().filter(|t| !t.is_empty()),
            },
            cache: CacheConfig {
                url: env::var("PAGES_CACHE_URL").unwrap_or_else(|_| "sqlite:data/page_cache.db".to_string()),
                capacity: env::var("PAGES_CACHE_CAPACITY")
                    .unwrap_or_else(|_| "256".to_string())
                    .parse()
                    .unwrap_or(256),
            },
        })
    }
}

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path of the cleaned catalog CSV
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Redis connection URL; metadata lookups are not cached when absent
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Jikan (MyAnimeList) API base URL
    #[serde(default = "default_metadata_api_url")]
    pub metadata_api_url: String,

    /// Upper bound on a single metadata lookup
    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,

    /// How long a successful metadata lookup stays cached
    #[serde(default = "default_metadata_cache_ttl_secs")]
    pub metadata_cache_ttl_secs: u64,

    /// Fixed seed for the exploration shuffle. Unset means entropy-seeded.
    #[serde(default)]
    pub exploration_seed: Option<u64>,

    /// Eligible top-score entries enqueued per cold-start refill
    #[serde(default = "default_fallback_pool_size")]
    pub fallback_pool_size: usize,

    /// Idle time after which a session is dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_catalog_path() -> String {
    "anime_romance.csv".to_string()
}

fn default_metadata_api_url() -> String {
    "https://api.jikan.moe/v4".to_string()
}

fn default_metadata_timeout_secs() -> u64 {
    5
}

fn default_metadata_cache_ttl_secs() -> u64 {
    3600
}

fn default_fallback_pool_size() -> usize {
    150
}

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL (session store)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Vector similarity index base URL
    #[serde(default = "default_vector_api_url")]
    pub vector_api_url: String,

    /// Vector similarity index API key
    pub vector_api_key: String,

    /// Metadata enrichment service base URL
    #[serde(default = "default_metadata_api_url")]
    pub metadata_api_url: String,

    /// Metadata enrichment service API key
    pub metadata_api_key: String,

    /// Preference-text service base URL (optional; deterministic template
    /// fallback is used when unset)
    #[serde(default)]
    pub preference_api_url: Option<String>,

    /// Preference-text service API key
    #[serde(default)]
    pub preference_api_key: Option<String>,

    /// Timeout applied to every outbound collaborator call, in milliseconds
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,

    /// Session time-to-live in seconds
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_vector_api_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_metadata_api_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_upstream_timeout_ms() -> u64 {
    3000
}

fn default_session_ttl_seconds() -> u64 {
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
}

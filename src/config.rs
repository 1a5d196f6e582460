use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub template: TemplateConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Snapshots kept per client; older ones are deleted after every ingestion.
    #[serde(default = "default_max_records_per_client")]
    pub max_records_per_client: u32,
}

fn default_max_records_per_client() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    /// Header carrying the caller address (set by the fronting proxy).
    #[serde(default = "default_client_ip_header")]
    pub client_ip_header: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            client_ip_header: default_client_ip_header(),
        }
    }
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_requests() -> usize {
    100
}

fn default_client_ip_header() -> String {
    "cf-connecting-ip".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_template_url")]
    pub url: String,
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            url: default_template_url(),
            cache_max_age_secs: default_cache_max_age_secs(),
        }
    }
}

fn default_template_url() -> String {
    "https://raw.githubusercontent.com/heyuecock/zsan-server-worker/refs/heads/main/index.html"
        .into()
}

fn default_cache_max_age_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.max_records_per_client > 0,
            "database.max_records_per_client must be > 0, got {}",
            self.database.max_records_per_client
        );
        anyhow::ensure!(
            self.rate_limit.window_secs > 0,
            "rate_limit.window_secs must be > 0, got {}",
            self.rate_limit.window_secs
        );
        anyhow::ensure!(
            self.rate_limit.max_requests > 0,
            "rate_limit.max_requests must be > 0, got {}",
            self.rate_limit.max_requests
        );
        anyhow::ensure!(
            axum::http::HeaderName::from_bytes(self.rate_limit.client_ip_header.as_bytes())
                .is_ok(),
            "rate_limit.client_ip_header is not a valid header name: {:?}",
            self.rate_limit.client_ip_header
        );
        anyhow::ensure!(
            !self.template.url.is_empty(),
            "template.url must be non-empty"
        );
        Ok(())
    }
}

use serde::Deserialize;

use crate::error::CollectError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub nexus: NexusConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_port() -> u16 {
    9103
}

fn default_host() -> String {
    "0.0.0.0".into()
}

/// Where blobstore capacity figures come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySource {
    /// Fields of the blobstore listing (`totalSizeInBytes`, `availableSpaceInBytes`, `blobCount`).
    #[default]
    Inline,
    /// One `blobstores/{name}/capacity` call per blobstore.
    Endpoint,
}

/// Which repositories get size and asset-count gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositorySizePolicy {
    /// Only listed repositories that at least one asset refers to.
    #[default]
    Observed,
    /// Every listed repository; those without assets report zero.
    ZeroFill,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NexusConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub capacity_source: CapacitySource,
    /// Max in-flight capacity lookups when `capacity_source = "endpoint"`.
    #[serde(default = "default_capacity_concurrency")]
    pub capacity_concurrency: usize,
    #[serde(default)]
    pub repository_size_policy: RepositorySizePolicy,
}

impl Default for NexusConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            request_timeout_secs: default_request_timeout_secs(),
            capacity_source: CapacitySource::default(),
            capacity_concurrency: default_capacity_concurrency(),
            repository_size_policy: RepositorySizePolicy::default(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_capacity_concurrency() -> usize {
    4
}

/// Connection parameters resolved for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl NexusConfig {
    /// Resolves url/username/password; an absent or blank value is `ConfigurationMissing`.
    /// Username and password are passed through untouched; only the url is trimmed. A
    /// password only has to be non-empty, spaces are valid characters in it.
    pub fn credentials(&self) -> Result<Credentials, CollectError> {
        fn required(v: &Option<String>, field: &'static str) -> Result<String, CollectError> {
            match v {
                Some(s) if !s.trim().is_empty() => Ok(s.clone()),
                _ => Err(CollectError::ConfigurationMissing(field)),
            }
        }
        Ok(Credentials {
            base_url: required(&self.url, "nexus.url")?
                .trim()
                .trim_end_matches('/')
                .to_string(),
            username: required(&self.username, "nexus.username")?,
            password: match &self.password {
                Some(p) if !p.is_empty() => p.clone(),
                _ => return Err(CollectError::ConfigurationMissing("nexus.password")),
            },
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// How often to log exporter stats (cycles ok/failed) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            stats_log_interval_secs: default_stats_log_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_stats_log_interval_secs() -> u64 {
    300
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `config.toml`); a missing file means all defaults.
    /// `NEXUS_URL`, `NEXUS_USER`, `NEXUS_PASS` and `SCRAPE_INTERVAL` override the file.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "config file not found; using defaults");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        let mut config: AppConfig = toml::from_str(&s)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests). No environment overrides.
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (normally the process environment). Empty values are
    /// ignored; whitespace-only values are ignored too, except for `NEXUS_PASS`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("NEXUS_URL") {
            self.nexus.url = Some(v);
        }
        if let Some(v) = get("NEXUS_USER") {
            self.nexus.username = Some(v);
        }
        if let Some(v) = lookup("NEXUS_PASS").filter(|v| !v.is_empty()) {
            self.nexus.password = Some(v);
        }
        if let Some(v) = get("SCRAPE_INTERVAL") {
            self.polling.interval_secs = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("SCRAPE_INTERVAL must be an integer: {}", e))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.nexus.request_timeout_secs > 0,
            "nexus.request_timeout_secs must be > 0, got {}",
            self.nexus.request_timeout_secs
        );
        anyhow::ensure!(
            self.nexus.capacity_concurrency > 0,
            "nexus.capacity_concurrency must be > 0, got {}",
            self.nexus.capacity_concurrency
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.stats_log_interval_secs > 0,
            "polling.stats_log_interval_secs must be > 0, got {}",
            self.polling.stats_log_interval_secs
        );
        Ok(())
    }
}

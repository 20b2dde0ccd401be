use crate::constants::{DAI, USDC, USDT, WETH};
use alloy_primitives::Address;
use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("error loading config: {0}")]
    ConfigError(String),
}

/// Load a TOML configuration file, expanding `${VAR}` references from
/// the environment (after sourcing `.env`).
pub async fn load_from_file<T: DeserializeOwned>(file_name: &str) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    let contents = expand_vars(&contents);
    Ok(toml::from_str(&contents)?)
}

fn expand_vars(raw_config: &str) -> String {
    let re = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}").expect("static pattern compiles");
    re.replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
        Ok(val) => val,
        Err(_) => caps[0].to_string(),
    })
    .to_string()
}

/// Top-level configuration of the aggregator core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub remote_store: RemoteStoreConfig,
    pub performance: PerformanceConfig,
    pub base_tokens: Vec<Address>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            remote_store: RemoteStoreConfig::default(),
            performance: PerformanceConfig::default(),
            base_tokens: default_base_tokens(),
        }
    }
}

impl AggregatorConfig {
    /// Apply environment overrides on top of file values and defaults.
    pub fn from_env() -> eyre::Result<Self> {
        dotenv().ok();
        let mut config = Self::default();
        config.remote_store = config.remote_store.apply_env()?;
        config.performance = config.performance.apply_env()?;
        if let Ok(raw) = env::var("BASE_TOKENS") {
            config.base_tokens = raw
                .split(',')
                .map(|token| {
                    token
                        .trim()
                        .parse::<Address>()
                        .map_err(|err| eyre::eyre!("invalid BASE_TOKENS entry {token:?}: {err}"))
                })
                .collect::<eyre::Result<Vec<Address>>>()?;
        }
        Ok(config)
    }
}

/// Connection settings of the remote backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteStoreConfig {
    pub addr: String,
    pub password: String,
    pub key_prefix: String,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            addr: "redis://localhost:6379".to_string(),
            password: String::new(),
            key_prefix: "dex:".to_string(),
        }
    }
}

impl RemoteStoreConfig {
    fn apply_env(mut self) -> eyre::Result<Self> {
        if let Ok(addr) = env::var("REMOTE_STORE_ADDR") {
            Url::parse(&addr).map_err(|err| eyre::eyre!("invalid REMOTE_STORE_ADDR: {err}"))?;
            self.addr = addr;
        }
        if let Ok(password) = env::var("REMOTE_STORE_PASSWORD") {
            self.password = password;
        }
        if let Ok(prefix) = env::var("REMOTE_STORE_KEY_PREFIX") {
            self.key_prefix = prefix;
        }
        Ok(self)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        Url::parse(&self.addr)
            .map_err(|err| eyre::eyre!("invalid remote store addr {:?}: {err}", self.addr))?;
        Ok(())
    }
}

/// Tunables of the quote pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Semaphore width for candidate path evaluation.
    pub max_concurrent_paths: usize,
    /// Default hop bound when a request omits one.
    pub max_hops: usize,
    /// Cap on candidate paths enumerated per quote.
    pub max_paths: usize,
    /// Price-impact ceiling per hop, in percent.
    pub max_slippage: f64,
    /// Local cache retention in seconds.
    pub cache_ttl_secs: u64,
    /// Per-quote deadline in seconds.
    pub request_timeout_secs: u64,
    /// Background graph rebuild cadence in seconds.
    pub graph_refresh_secs: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_paths: 10,
            max_hops: 3,
            max_paths: 20,
            max_slippage: 5.0,
            cache_ttl_secs: 300,
            request_timeout_secs: 30,
            graph_refresh_secs: 30,
        }
    }
}

impl PerformanceConfig {
    fn apply_env(mut self) -> eyre::Result<Self> {
        if let Ok(raw) = env::var("MAX_CONCURRENT_PATHS") {
            self.max_concurrent_paths =
                raw.parse().map_err(|err| eyre::eyre!("invalid MAX_CONCURRENT_PATHS: {err}"))?;
        }
        if let Ok(raw) = env::var("MAX_HOPS") {
            self.max_hops = raw.parse().map_err(|err| eyre::eyre!("invalid MAX_HOPS: {err}"))?;
        }
        if let Ok(raw) = env::var("MAX_PATHS") {
            self.max_paths = raw.parse().map_err(|err| eyre::eyre!("invalid MAX_PATHS: {err}"))?;
        }
        if let Ok(raw) = env::var("MAX_SLIPPAGE") {
            self.max_slippage =
                raw.parse().map_err(|err| eyre::eyre!("invalid MAX_SLIPPAGE: {err}"))?;
        }
        if let Ok(raw) = env::var("CACHE_TTL_SECONDS") {
            self.cache_ttl_secs =
                raw.parse().map_err(|err| eyre::eyre!("invalid CACHE_TTL_SECONDS: {err}"))?;
        }
        if let Ok(raw) = env::var("REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_secs =
                raw.parse().map_err(|err| eyre::eyre!("invalid REQUEST_TIMEOUT_SECONDS: {err}"))?;
        }
        if let Ok(raw) = env::var("GRAPH_REFRESH_SECONDS") {
            self.graph_refresh_secs =
                raw.parse().map_err(|err| eyre::eyre!("invalid GRAPH_REFRESH_SECONDS: {err}"))?;
        }
        Ok(self)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn graph_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.graph_refresh_secs)
    }
}

pub fn default_base_tokens() -> Vec<Address> {
    vec![WETH, USDT, USDC, DAI]
}

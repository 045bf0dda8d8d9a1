//! Configuration types
//!
//! Every field has a fixed default. `ProxyConfig::load` layers `LLAMA_*`
//! environment overrides on top of those defaults, e.g.
//! `LLAMA_SERVER__PORT=9090` or `LLAMA_UPSTREAM__DEFI_BASE=http://localhost:4000`.

use ::config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreResult;

pub const DEFI_API_BASE: &str = "https://api.llama.fi";
pub const COIN_API_BASE: &str = "https://coins.llama.fi";
pub const USER_AGENT: &str = "DEFI-APP/1.0";
pub const ACCEPT: &str = "application/geo+json";

/// Upstream API hosts and request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub defi_base: String,
    pub coin_base: String,
    pub user_agent: String,
    pub accept: String,
    pub request_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            defi_base: DEFI_API_BASE.to_string(),
            coin_base: COIN_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            accept: ACCEPT.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Which front-end the process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// HTTP endpoints plus the SSE push channel
    Http,
    /// JSON-RPC tool server on stdin/stdout
    Stdio,
}

/// Listener and push-loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive_timeout_secs: u64,
    pub push_interval_ms: u64,
    pub transport: Transport,
}

impl ServerConfig {
    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout_secs)
    }

    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            keep_alive_timeout_secs: 65,
            push_interval_ms: 1000,
            transport: Transport::Http,
        }
    }
}

/// Complete proxy configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub upstream: UpstreamConfig,
    pub server: ServerConfig,
}

impl ProxyConfig {
    /// Defaults overlaid with `LLAMA_*` environment variables
    pub fn load() -> CoreResult<Self> {
        Self::load_from(Environment::with_prefix("LLAMA"))
    }

    fn load_from(env: Environment) -> CoreResult<Self> {
        let defaults = Config::try_from(&ProxyConfig::default())?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

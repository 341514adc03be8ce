//! Application configuration.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Distribution engine configuration.
    #[serde(default)]
    pub distribution: DistributionConfig,
    /// Remote instance agent configuration.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Service message defaults.
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Storage configuration.
///
/// When `data_dir` is unset the message and instance registries live in
/// memory only and are lost on restart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `serviceMessages.json` and `sofieInstances.json`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Path of the service message registry file, if persistence is enabled.
    #[must_use]
    pub fn messages_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join("serviceMessages.json"))
    }

    /// Path of the instance registry file, if persistence is enabled.
    #[must_use]
    pub fn instances_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join("sofieInstances.json"))
    }
}

/// Distribution engine configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DistributionConfig {
    /// Fixed delay before a failed job is retried, in seconds. At least 1.
    #[serde(default = "default_retry_delay_secs")]
    #[validate(range(min = 1))]
    pub retry_delay_secs: u64,
    /// Delay before a freshly scheduled job first runs, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Re-derive unfinished jobs from the message registry on startup.
    #[serde(default = "default_true")]
    pub resume_on_startup: bool,
}

impl DistributionConfig {
    /// Retry delay as a [`Duration`].
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Initial delay as a [`Duration`].
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay_secs(),
            initial_delay_ms: default_initial_delay_ms(),
            resume_on_startup: true,
        }
    }
}

/// Remote instance agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Total request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Connect timeout, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// User-Agent header sent to remote instances.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Service message defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesConfig {
    /// Sender stamped on every message created through this monitor.
    #[serde(default = "default_sender")]
    pub sender: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            sender: default_sender(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_retry_delay_secs() -> u64 {
    30
}

const fn default_initial_delay_ms() -> u64 {
    1
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("sofie-monitor/{} sofie-core agent", env!("CARGO_PKG_VERSION"))
}

fn default_sender() -> String {
    "sofie-monitor".to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `SOFIE_MONITOR_ENV`)
    /// 3. Environment variables with `SOFIE_MONITOR_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env =
            std::env::var("SOFIE_MONITOR_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SOFIE_MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that deserialize but cannot run, such as a zero
    /// retry delay.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.distribution
            .validate()
            .map_err(|e| config::ConfigError::Message(format!("distribution: {e}")))
    }
}

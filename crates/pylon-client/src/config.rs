// Client configuration: programmatic fields plus env/yaml tuning overrides.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub(crate) const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_MAX_SERVER_PING_DELAY: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
pub(crate) const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_BACKOFF_JITTER: f64 = 0.2;
// Fixed wait after a token-verification close (code 4333); overrides backoff.
pub(crate) const DEFAULT_TOKEN_VERIFICATION_DELAY: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_NETWORK_CHECK_INTERVAL: Duration = Duration::from_secs(2);
pub(crate) const DEFAULT_EVENT_QUEUE_DEPTH: usize = 1024;

/// Configuration for a [`crate::Client`].
///
/// `address` is the only required field. Tuning knobs can additionally be
/// overridden from `PYLON_*` environment variables or a yaml file named by
/// `PYLON_CLIENT_CONFIG`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint URL.
    pub address: String,
    /// Bearer token sent with the connect handshake. May be set later via
    /// [`crate::Client::set_access_token`].
    pub access_token: String,
    /// Client name reported in the handshake.
    pub name: String,
    /// Client version reported in the handshake.
    pub version: String,
    /// Per-command reply timeout.
    pub command_timeout: Duration,
    /// Grace added to the server-advertised ping interval before the
    /// connection is considered stalled.
    pub max_server_ping_delay: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub backoff_jitter: f64,
    pub token_verification_delay: Duration,
    /// Reachability poll period while reconnection is suspended; clamped to
    /// at least one second.
    pub network_check_interval: Duration,
    /// Capacity of the transport event queue feeding the dispatch loop.
    pub event_queue_depth: usize,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            access_token: String::new(),
            name: "rust".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_server_ping_delay: DEFAULT_MAX_SERVER_PING_DELAY,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_cap: DEFAULT_BACKOFF_CAP,
            backoff_jitter: DEFAULT_BACKOFF_JITTER,
            token_verification_delay: DEFAULT_TOKEN_VERIFICATION_DELAY,
            network_check_interval: DEFAULT_NETWORK_CHECK_INTERVAL,
            event_queue_depth: DEFAULT_EVENT_QUEUE_DEPTH,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    pub fn from_env(address: impl Into<String>) -> Self {
        let mut config = Self::new(address);
        if let Some(value) = read_u64_env("PYLON_COMMAND_TIMEOUT_MS") {
            config.command_timeout = Duration::from_millis(value);
        }
        if let Some(value) = read_u64_env("PYLON_MAX_SERVER_PING_DELAY_MS") {
            config.max_server_ping_delay = Duration::from_millis(value);
        }
        if let Some(value) = read_u64_env("PYLON_BACKOFF_BASE_MS") {
            config.backoff_base = Duration::from_millis(value);
        }
        if let Some(value) = read_u64_env("PYLON_BACKOFF_CAP_MS") {
            config.backoff_cap = Duration::from_millis(value);
        }
        if let Some(value) = read_u64_env("PYLON_NETWORK_CHECK_INTERVAL_MS") {
            config.network_check_interval = Duration::from_millis(value);
        }
        if let Some(value) = read_usize_env("PYLON_EVENT_QUEUE_DEPTH") {
            config.event_queue_depth = value;
        }
        config
    }

    pub fn from_env_or_yaml(address: impl Into<String>, config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::from_env(address);
        let override_path = config_path
            .map(|value| value.to_string())
            .or_else(|| std::env::var("PYLON_CLIENT_CONFIG").ok());
        if let Some(path) = override_path.as_deref() {
            let contents =
                fs::read_to_string(path).with_context(|| format!("read client config: {path}"))?;
            let override_cfg: ClientConfigOverride =
                serde_yaml::from_str(&contents).context("parse client config yaml")?;
            override_cfg.apply(&mut config);
        }
        Ok(config)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct ClientConfigOverride {
    command_timeout_ms: Option<u64>,
    max_server_ping_delay_ms: Option<u64>,
    backoff_base_ms: Option<u64>,
    backoff_cap_ms: Option<u64>,
    backoff_jitter: Option<f64>,
    network_check_interval_ms: Option<u64>,
    event_queue_depth: Option<usize>,
}

impl ClientConfigOverride {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(value) = self.command_timeout_ms
            && value > 0
        {
            config.command_timeout = Duration::from_millis(value);
        }
        if let Some(value) = self.max_server_ping_delay_ms {
            config.max_server_ping_delay = Duration::from_millis(value);
        }
        if let Some(value) = self.backoff_base_ms
            && value > 0
        {
            config.backoff_base = Duration::from_millis(value);
        }
        if let Some(value) = self.backoff_cap_ms
            && value > 0
        {
            config.backoff_cap = Duration::from_millis(value);
        }
        if let Some(value) = self.backoff_jitter
            && (0.0..=1.0).contains(&value)
        {
            config.backoff_jitter = value;
        }
        if let Some(value) = self.network_check_interval_ms
            && value > 0
        {
            config.network_check_interval = Duration::from_millis(value);
        }
        if let Some(value) = self.event_queue_depth
            && value > 0
        {
            config.event_queue_depth = value;
        }
    }
}

fn read_u64_env(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn read_usize_env(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}

//! Application settings and configuration structures.

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::OverflowPolicy;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Listener configuration (host, port)
    pub server: ServerSettings,

    /// WebSocket transport and outbound queue configuration
    pub websocket: WebSocketSettings,

    /// Social graph backend
    pub profile_store: ProfileStoreSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on. `0` picks an ephemeral port.
    pub port: u16,
}

/// WebSocket configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes (default: 64KB)
    pub max_message_size: usize,

    /// Maximum frame size in bytes (default: 16KB)
    pub max_frame_size: usize,

    /// Frames buffered per connection before the overflow policy applies
    pub outbound_queue_capacity: usize,

    /// What to do when a connection's outbound queue is full
    pub overflow_policy: OverflowPolicy,

    /// Interval between server pings in milliseconds (default: 30000)
    pub heartbeat_interval_ms: u64,

    /// Extra silence tolerated after a missed heartbeat (default: 10000)
    pub heartbeat_grace_ms: u64,
}

/// Profile store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStoreBackend {
    Redis,
    Memory,
}

/// Profile store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileStoreSettings {
    pub backend: ProfileStoreBackend,

    /// Redis connection URL
    pub url: String,

    /// Prefix prepended to every Redis key
    pub key_prefix: String,

    /// JSON file used to seed the in-memory backend
    #[serde(default)]
    pub seed_path: Option<String>,

    /// Upper bound on a single store call in milliseconds (default: 2000)
    pub timeout_ms: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed, or
    /// if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        // WS_PORT is the listener port name used by existing deployments
        let port = std::env::var("SERVER_PORT")
            .ok()
            .or_else(|| std::env::var("WS_PORT").ok());

        let settings: Self = Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=8080 -> server.port = 8080
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", port)?
            .set_override_option("profile_store.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("profile_store.backend", std::env::var("PROFILE_STORE").ok())?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Built-in defaults, before any file or environment source.
    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])?
            // WebSocket settings - limits against oversized frames
            .set_default("websocket.max_message_size", 65536_i64)? // 64KB
            .set_default("websocket.max_frame_size", 16384_i64)? // 16KB
            .set_default("websocket.outbound_queue_capacity", 256_i64)?
            .set_default("websocket.overflow_policy", "drop_oldest")?
            .set_default("websocket.heartbeat_interval_ms", 30000_i64)?
            .set_default("websocket.heartbeat_grace_ms", 10000_i64)?
            .set_default("profile_store.backend", "redis")?
            .set_default("profile_store.url", "redis://127.0.0.1:6379")?
            .set_default("profile_store.key_prefix", "feed:")?
            .set_default("profile_store.timeout_ms", 2000_i64)
    }

    /// Defaults only. Used by tests and embedders that build settings in code.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the defaults fail to deserialize.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder("test")?.build()?.try_deserialize()
    }

    /// Reject values the gateway cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.websocket.outbound_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "websocket.outbound_queue_capacity must be at least 1".into(),
            ));
        }
        if self.websocket.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Message(
                "websocket.heartbeat_interval_ms must be greater than 0".into(),
            ));
        }
        if self.profile_store.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "profile_store.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.profile_store.backend == ProfileStoreBackend::Redis
            && self.profile_store.url.trim().is_empty()
        {
            return Err(ConfigError::Message(
                "profile_store.url is required for the redis backend".into(),
            ));
        }
        Ok(())
    }
}

impl ServerSettings {
    /// Get the socket address for binding.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("Invalid server address: {}", e)))
    }
}

impl ProfileStoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl WebSocketSettings {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Silence after which a connection is considered dead.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms + self.heartbeat_grace_ms)
    }
}

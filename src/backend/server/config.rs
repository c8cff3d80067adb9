/**
 * Server Configuration
 *
 * This module binds the application configuration and opens the SQLite
 * connection pool it describes.
 *
 * # Configuration Sources
 *
 * Values are resolved in this order, later sources winning:
 * 1. Built-in defaults (suitable for local development)
 * 2. A TOML file, `parlour.toml` or the path in `PARLOUR_CONFIG`
 * 3. Environment variables (a `.env` file is loaded by the binary first)
 *
 * The merged result is validated before the server starts. Unlike optional
 * integrations, the database is required: a pool that cannot be opened or
 * migrated stops startup.
 *
 * # Example
 *
 * ```toml
 * [server]
 * port = 9000
 *
 * [model]
 * name = "qwen2.5"
 * system_prompt = "You are a concise assistant."
 * ```
 */

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

/// Environment variable naming the TOML file to load
pub const CONFIG_PATH_ENV: &str = "PARLOUR_CONFIG";

/// File loaded when `PARLOUR_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "parlour.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Full application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub model: ModelSettings,
    pub chat: ChatSettings,
}

/// HTTP listener and static assets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory holding the single-page frontend
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: PathBuf::from("public"),
        }
    }
}

/// SQLite connection pool
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://parlour.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseSettings {
    /// In-memory databases exist per connection, so the pool must hold one
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Bearer-token verification
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Accepted `iss` claim values
    pub issuers: Vec<String>,
    /// OAuth client id; when set, the `aud` claim must match it
    pub audience: Option<String>,
    /// JSON Web Key Set of the identity provider
    pub jwks_url: String,
    pub jwks_cache_ttl_secs: u64,
    /// HS256 secret replacing the key set, for local development and tests
    pub shared_secret: Option<String>,
    /// Enables `POST /api/auth/dev-token`
    pub dev_login: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            issuers: vec![
                "https://accounts.google.com".to_string(),
                "accounts.google.com".to_string(),
            ],
            audience: None,
            jwks_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            jwks_cache_ttl_secs: 3600,
            shared_secret: None,
            dev_login: false,
        }
    }
}

/// Ollama model settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    /// Endpoint override, e.g. `http://ollama:11434/`
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    /// Prepended to every turn's history
    pub system_prompt: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "llama3.2".to_string(),
            base_url: None,
            temperature: None,
            system_prompt: None,
        }
    }
}

/// Chat pipeline limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Saved messages sent to the model as context
    pub history_limit: u32,
    pub max_message_chars: usize,
    /// Hide `<think>` blocks emitted by reasoning models
    pub strip_reasoning: bool,
    /// Events buffered between the model task and the SSE response
    pub stream_buffer: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_limit: 20,
            max_message_chars: 10_000,
            strip_reasoning: false,
            stream_buffer: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional TOML file and the environment
    ///
    /// An explicit `path` must exist. Without one, `PARLOUR_CONFIG` or
    /// `parlour.toml` is used when present and skipped otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            },
        };

        let mut config = if path.exists() || required {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            tracing::info!("Loaded configuration from {}", path.display());
            Self::from_toml_str(&raw)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Override individual settings from environment variables
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_string("PARLOUR_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse::<u16>("PARLOUR_PORT")? {
            self.server.port = port;
        }
        if let Some(dir) = env_string("PARLOUR_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }
        if let Some(url) = env_string("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(client_id) = env_string("OAUTH_CLIENT_ID") {
            self.auth.audience = Some(client_id);
        }
        if let Some(url) = env_string("OAUTH_JWKS_URL") {
            self.auth.jwks_url = url;
        }
        if let Some(secret) = env_string("AUTH_SHARED_SECRET") {
            self.auth.shared_secret = Some(secret);
        }
        if let Some(dev_login) = env_parse::<bool>("AUTH_DEV_LOGIN")? {
            self.auth.dev_login = dev_login;
        }
        if let Some(model) = env_string("OLLAMA_MODEL") {
            self.model.name = model;
        }
        if let Some(url) = env_string("OLLAMA_BASE_URL") {
            self.model.base_url = Some(url);
        }
        if let Some(prompt) = env_string("CHAT_SYSTEM_PROMPT") {
            self.model.system_prompt = Some(prompt);
        }
        Ok(())
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.server.port == 0 {
            return invalid("server.port must be non-zero");
        }
        if self.database.url.trim().is_empty() {
            return invalid("database.url cannot be empty");
        }
        if self.database.max_connections == 0 {
            return invalid("database.max_connections must be at least 1");
        }
        if self.auth.issuers.is_empty() {
            return invalid("auth.issuers cannot be empty");
        }
        if self.auth.dev_login && self.auth.shared_secret.is_none() {
            return invalid("auth.dev_login requires auth.shared_secret");
        }
        if self.model.name.trim().is_empty() {
            return invalid("model.name cannot be empty");
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return invalid("model.temperature must be between 0.0 and 2.0");
            }
        }
        if self.chat.history_limit == 0 {
            return invalid("chat.history_limit must be at least 1");
        }
        if self.chat.max_message_chars == 0 {
            return invalid("chat.max_message_chars must be at least 1");
        }
        if self.chat.stream_buffer == 0 {
            return invalid("chat.stream_buffer must be at least 1");
        }
        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env_string(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
        None => Ok(None),
    }
}

/// Open the SQLite connection pool described by `settings`
///
/// Foreign keys are enforced so deleting a conversation removes its messages.
pub async fn connect_database(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let options = SqliteConnectOptions::from_str(&settings.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new();
    let max_connections = if settings.is_in_memory() {
        // An in-memory database lives and dies with its single connection
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        1
    } else {
        settings.max_connections
    };

    let pool = pool_options
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    tracing::info!("Database connection pool created ({} connections)", max_connections);
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(pool).await?;
    tracing::info!("Database migrations completed successfully");
    Ok(())
}

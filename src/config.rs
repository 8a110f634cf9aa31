// Server and client configuration.
// Sources, lowest to highest priority: built-in defaults, config.toml, APP_* environment variables.

use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SUGGESTION_LIMIT: u32 = 8;
pub const DEFAULT_POPULAR_BRAND_LIMIT: u32 = 10;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    // Postgres connection string; without it the in-memory inventory is used
    pub database_url: Option<String>,
    // JSON inventory loaded into the in-memory store
    pub seed_file: Option<String>,
    pub run_migrations: bool,
    pub static_dir: String,
    pub page_size: u32,
    pub suggestion_limit: u32,
    pub popular_brand_limit: u32,
    pub db_max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            database_url: None,
            seed_file: None,
            run_migrations: false,
            static_dir: "static".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            popular_brand_limit: DEFAULT_POPULAR_BRAND_LIMIT,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let defaults = Settings::default();
        let builder = Config::builder()
            .set_default("server_address", defaults.server_address)?
            .set_default("run_migrations", defaults.run_migrations)?
            .set_default("static_dir", defaults.static_dir)?
            .set_default("page_size", i64::from(defaults.page_size))?
            .set_default("suggestion_limit", i64::from(defaults.suggestion_limit))?
            .set_default("popular_brand_limit", i64::from(defaults.popular_brand_limit))?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            // Load from a configuration file (e.g., config.toml)
            .add_source(File::with_name("config").required(false))
            // Load from environment variables (e.g., APP_DATABASE_URL)
            .add_source(Environment::with_prefix("APP").try_parsing(true));

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        if settings.page_size == 0 {
            tracing::warn!("page_size of 0 is not usable, falling back to {}", DEFAULT_PAGE_SIZE);
            settings.page_size = DEFAULT_PAGE_SIZE;
        }
        Ok(settings)
    }
}

/// Settings of the storefront client core (search results, autocomplete, admin edits).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub debounce_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: format!("http://{DEFAULT_SERVER_ADDRESS}"),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl ClientSettings {
    /// Same sources as [`Settings::new`], read from `client.toml` and `APP_CLIENT_*` variables
    /// (e.g. `APP_CLIENT_DEBOUNCE_MS`).
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let settings = Self::with_defaults()?
            .add_source(File::with_name("client").required(false))
            .add_source(Environment::with_prefix("APP_CLIENT").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = ClientSettings::default();
        Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("request_timeout_secs", i64::try_from(defaults.request_timeout_secs).unwrap_or(i64::MAX))?
            .set_default("debounce_ms", i64::try_from(defaults.debounce_ms).unwrap_or(i64::MAX))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

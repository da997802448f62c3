//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then environment variables (`CLICKHOUSE_URL`, `PORT`, `LISTEN_HOST`, ...). They are
//! read once at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use netwatch_store::ClickHouseConfig;
use netwatch_types::{Filter, FilterInput, MAX_HOURS, MAX_LIMIT, MIN_HOURS};
use serde::Deserialize;

/// Default location of the built dashboard bundle.
pub const DEFAULT_UI_HTML_PATH: &str = "dist/health-dashboard.html";

/// Everything the server and client need to run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_username: String,
    pub clickhouse_password: String,

    /// Address the HTTP transport binds to.
    pub listen_host: String,
    pub port: u16,

    /// Window used when a caller does not supply one.
    pub default_hours: u32,
    /// Row limit used when a caller does not supply one.
    pub default_limit: u32,
    /// Per-query timeout in seconds.
    pub query_timeout: u64,
    /// Auto-refresh period in seconds.
    pub refresh_interval: u64,

    pub ui_html_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clickhouse_url: "http://localhost:8123".to_string(),
            clickhouse_database: "omnis".to_string(),
            clickhouse_username: "default".to_string(),
            clickhouse_password: String::new(),
            listen_host: "0.0.0.0".to_string(),
            port: 8002,
            default_hours: 24,
            default_limit: 10,
            query_timeout: 30,
            refresh_interval: 60,
            ui_html_path: PathBuf::from(DEFAULT_UI_HTML_PATH),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), but reads environment variables from
    /// `env` instead of the process when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("clickhouse_url", defaults.clickhouse_url)?
            .set_default("clickhouse_database", defaults.clickhouse_database)?
            .set_default("clickhouse_username", defaults.clickhouse_username)?
            .set_default("clickhouse_password", defaults.clickhouse_password)?
            .set_default("listen_host", defaults.listen_host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("default_hours", i64::from(defaults.default_hours))?
            .set_default("default_limit", i64::from(defaults.default_limit))?
            .set_default("query_timeout", defaults.query_timeout as i64)?
            .set_default("refresh_interval", defaults.refresh_interval as i64)?
            .set_default("ui_html_path", DEFAULT_UI_HTML_PATH)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::default().source(env))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_HOURS..=MAX_HOURS).contains(&self.default_hours) {
            return Err(ConfigError::Message(format!(
                "default_hours must be between {} and {}",
                MIN_HOURS, MAX_HOURS
            )));
        }
        if self.default_limit == 0 || self.default_limit > MAX_LIMIT {
            return Err(ConfigError::Message(format!(
                "default_limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        if self.query_timeout == 0 {
            return Err(ConfigError::Message("query_timeout must be positive".into()));
        }
        if self.refresh_interval == 0 {
            return Err(ConfigError::Message(
                "refresh_interval must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Connection settings for the ClickHouse store.
    pub fn clickhouse(&self) -> ClickHouseConfig {
        ClickHouseConfig {
            url: self.clickhouse_url.clone(),
            database: self.clickhouse_database.clone(),
            username: self.clickhouse_username.clone(),
            password: self.clickhouse_password.clone(),
            timeout: self.query_timeout(),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    /// Normalize caller input with this deployment's defaults.
    pub fn filter(&self, input: FilterInput) -> Filter {
        input.normalize_with(self.default_hours, self.default_limit)
    }
}

//! Warehouse configuration.
//!
//! Settings are read once at startup from an optional TOML secrets file and
//! `FRAUDWATCH_WAREHOUSE__*` environment variables, in that order:
//!
//! ```toml
//! [warehouse]
//! database = "/srv/fraud/warehouse.duckdb"
//! schema = "GOLD"
//! cache_ttl_secs = 600
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub use ::config::ConfigError;

use crate::duckdb::AccessMode;
use crate::error::WarehouseError;

/// Configuration for the warehouse connection and the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    /// Schema holding the reporting views.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// How long a cached result stays valid.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum number of rows materialized per query.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Open the database read-only.
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

#[derive(Debug, Deserialize)]
struct Settings {
    #[serde(default)]
    warehouse: Option<WarehouseConfig>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            schema: default_schema(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_rows: default_max_rows(),
            read_only: default_read_only(),
        }
    }
}

impl WarehouseConfig {
    /// Load from the default secrets file (if present) and the environment.
    pub fn load_default() -> Result<Self, WarehouseError> {
        Self::load(default_secrets_path().as_path())
    }

    /// Load from `path` (optional file) and the environment, then validate.
    pub fn load(path: &Path) -> Result<Self, WarehouseError> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                ::config::Environment::with_prefix("FRAUDWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config = settings
            .try_deserialize::<Settings>()?
            .warehouse
            .unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Validate that values are usable.
    pub fn validate(&self) -> Result<(), WarehouseError> {
        if !is_identifier(self.schema.as_str()) {
            return Err(WarehouseError::Config(ConfigError::Message(format!(
                "schema '{}' must be a plain SQL identifier",
                self.schema
            ))));
        }
        if self.cache_ttl_secs == 0 {
            return Err(WarehouseError::Config(ConfigError::Message(
                String::from("cache_ttl_secs must be greater than zero"),
            )));
        }
        if self.max_rows == 0 {
            return Err(WarehouseError::Config(ConfigError::Message(
                String::from("max_rows must be greater than zero"),
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn access_mode(&self) -> AccessMode {
        if self.read_only {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Default secrets file location.
pub fn default_secrets_path() -> PathBuf {
    resolve_fraudwatch_home().join("secrets.toml")
}

fn default_database() -> PathBuf {
    resolve_fraudwatch_home().join("warehouse.duckdb")
}

fn default_schema() -> String {
    String::from("GOLD")
}

const fn default_cache_ttl_secs() -> u64 {
    600
}

const fn default_max_rows() -> usize {
    100_000
}

const fn default_read_only() -> bool {
    true
}

/// Resolve the fraudwatch home directory from environment or default.
fn resolve_fraudwatch_home() -> PathBuf {
    if let Some(path) = env::var_os("FRAUDWATCH_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".fraudwatch");
    }

    PathBuf::from(".fraudwatch")
}

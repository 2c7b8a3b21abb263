//! Service configuration
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML file, `$CONFIG_FILE` or `config/default.toml` (optional)
//! 3. Environment variables prefixed `USER_SERVICE_`, with `__` between
//!    section and key, e.g. `USER_SERVICE_DATABASE__HOST=db.internal`
//!
//! ```toml
//! [server]
//! env = "prod"
//!
//! [database]
//! host = "db.internal"
//! ssl_mode = "require"
//!
//! [crypto]
//! hash_memory_kib = 65536
//! ```

use std::fmt;
use std::str::FromStr;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use sqlx::postgres::PgSslMode;

use domain_user::HashingConfig;
use infra_db::DatabaseConfig;

use crate::error::ConfigError;

/// Environment variable naming an alternative config file
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Config file read when `CONFIG_FILE` is unset
pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "USER_SERVICE";

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub crypto: CryptoSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Deployment environment: `dev`, `test` or `prod`
    pub env: String,
    pub name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            name: "user".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("prod")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directive for the env filter, e.g. `info` or `infra_db=debug,info`
    pub min_level: String,
    /// Forces JSON output on or off; defaults to on in production
    pub json: Option<bool>,
    pub use_color: bool,
    /// Adds source file and line to every event
    pub report_caller: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            min_level: "info".to_string(),
            json: None,
            use_color: true,
            report_caller: false,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// `disable`, `allow`, `prefer`, `require`, `verify-ca` or `verify-full`
    pub ssl_mode: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "users".to_string(),
            ssl_mode: "prefer".to_string(),
            max_connections: 10,
            min_connections: 2,
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .finish()
    }
}

impl DatabaseSettings {
    /// Converts to pool settings
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidSslMode` for an unknown SSL mode
    pub fn to_database_config(&self) -> Result<DatabaseConfig, ConfigError> {
        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .map_err(|_| ConfigError::InvalidSslMode(self.ssl_mode.clone()))?;

        Ok(DatabaseConfig::new(
            self.host.clone(),
            self.port,
            self.user.clone(),
            self.password.clone(),
            self.name.clone(),
        )
        .ssl_mode(ssl_mode)
        .max_connections(self.max_connections)
        .min_connections(self.min_connections))
    }
}

/// Connection settings of the external cache
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: String::new(),
        }
    }
}

impl fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CacheSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Password hashing work factor
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CryptoSettings {
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
}

impl Default for CryptoSettings {
    fn default() -> Self {
        let defaults = HashingConfig::default();
        Self {
            hash_memory_kib: defaults.memory_kib,
            hash_iterations: defaults.iterations,
            hash_parallelism: defaults.parallelism,
        }
    }
}

impl From<CryptoSettings> for HashingConfig {
    fn from(settings: CryptoSettings) -> Self {
        HashingConfig {
            memory_kib: settings.hash_memory_kib,
            iterations: settings.hash_iterations,
            parallelism: settings.hash_parallelism,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the default file location and environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path, ENV_PREFIX)
    }

    /// Loads configuration from an optional TOML file and prefixed environment
    pub fn load_from(path: &str, env_prefix: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(environment(env_prefix))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Parses configuration from TOML text, without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Stamps the service name; test runs get a `_test` suffix and no color
    pub fn for_service(mut self, service_name: &str, test: bool) -> Self {
        self.server.name = service_name.to_string();
        if test {
            self.server.name.push_str("_test");
            self.logging.use_color = false;
        }
        self
    }

    /// Whether logs are emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or_else(|| self.server.is_production())
    }
}

fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

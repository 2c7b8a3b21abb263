//! User Service
//!
//! Wires the user store together from configuration:
//!
//! - [`config`]: layered configuration (defaults, TOML file, environment)
//! - [`telemetry`]: `tracing` subscriber setup, JSON in production
//! - [`Services`]: pool, cache and repository built from an [`AppConfig`]
//!
//! # Example
//!
//! ```rust,ignore
//! let config = user_service::bootstrap("user", false)?;
//! user_service::telemetry::init_tracing(&config)?;
//! let services = Services::connect(config).await?;
//! services.verify_storage().await?;
//! ```

pub mod config;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

use tracing::{info, warn};

use core_kernel::{CachePort, HealthCheckResult, HealthCheckable, InMemoryCache};
use domain_user::PasswordHasher;
use infra_db::{create_pool, DatabasePool, UserRepository};

pub use config::AppConfig;
pub use error::{ConfigError, ServiceError};

/// Loads configuration and stamps the service identity
///
/// # Errors
///
/// Fails when a configuration source cannot be read or deserialized.
pub fn bootstrap(service_name: &str, test: bool) -> Result<AppConfig, ConfigError> {
    Ok(AppConfig::load()?.for_service(service_name, test))
}

/// Long-lived handles shared by every request
#[derive(Clone)]
pub struct Services {
    pub config: AppConfig,
    pub pool: DatabasePool,
    pub cache: Arc<dyn CachePort>,
    pub users: UserRepository,
}

impl Services {
    /// Opens the database pool and builds the repositories
    pub async fn connect(config: AppConfig) -> Result<Self, ServiceError> {
        let database = config.database.to_database_config()?;
        let pool = create_pool(&database).await?;
        Self::with_pool(config, pool)
    }

    /// Builds the repositories on an existing pool
    pub fn with_pool(config: AppConfig, pool: DatabasePool) -> Result<Self, ServiceError> {
        let hasher = PasswordHasher::new(config.crypto.into())?;

        // no networked cache adapter ships with this crate
        info!(configured = %config.cache.address(), "Using in-process cache");
        let cache: Arc<dyn CachePort> = Arc::new(InMemoryCache::new());

        let users = UserRepository::new(pool.clone(), cache.clone(), hasher);

        Ok(Self {
            config,
            pool,
            cache,
            users,
        })
    }

    /// Runs the storage health check
    ///
    /// # Errors
    ///
    /// `ServiceError::Unhealthy` when storage does not answer.
    pub async fn verify_storage(&self) -> Result<HealthCheckResult, ServiceError> {
        let health = self.users.health_check().await;
        if health.is_healthy() {
            info!(latency_ms = health.latency_ms, "Storage is healthy");
            Ok(health)
        } else {
            let message = health.message.unwrap_or_else(|| "no details".to_string());
            warn!(%message, "Storage is unhealthy");
            Err(ServiceError::Unhealthy(message))
        }
    }
}

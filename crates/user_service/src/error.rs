//! Service bootstrap errors

use thiserror::Error;

use domain_user::UserError;
use infra_db::DatabaseError;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid database ssl mode: {0:?}")]
    InvalidSslMode(String),
}

/// Errors raised while wiring the service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid password hashing configuration: {0}")]
    Hashing(#[from] UserError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("storage is unhealthy: {0}")]
    Unhealthy(String),
}

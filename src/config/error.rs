//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address")]
    InvalidHost,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Mercado Pago API base URL")]
    InvalidApiBaseUrl,

    #[error("Invalid status query timeout")]
    InvalidStatusQueryTimeout,

    #[error("Request timeout ({request}s) must exceed status query timeout ({query}s)")]
    RequestTimeoutTooShort { request: u64, query: u64 },

    #[error("Signature max age must be positive")]
    InvalidSignatureMaxAge,

    #[error("Confirmed user role must not be empty")]
    EmptyUserRole,
}

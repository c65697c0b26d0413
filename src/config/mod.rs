//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `PAYMENT_WEBHOOK` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use payment_webhook_receiver::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod mercadopago;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use mercadopago::MercadoPagoConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Mercado Pago configuration (webhook secret, access token)
    #[serde(default)]
    pub mercadopago: MercadoPagoConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYMENT_WEBHOOK` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYMENT_WEBHOOK__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYMENT_WEBHOOK__MERCADOPAGO__WEBHOOK_SECRET=...` -> `mercadopago.webhook_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMENT_WEBHOOK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Production additionally requires a database and a webhook secret.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.mercadopago.validate()?;

        // The status query runs inside the request, so it needs headroom.
        if self.server.request_timeout_secs <= self.mercadopago.status_query_timeout_secs {
            return Err(ValidationError::RequestTimeoutTooShort {
                request: self.server.request_timeout_secs,
                query: self.mercadopago.status_query_timeout_secs,
            });
        }

        if self.is_production() {
            if self.database.url().is_none() {
                return Err(ValidationError::MissingRequired("DATABASE__URL"));
            }
            if self.mercadopago.webhook_secret().is_none() {
                return Err(ValidationError::MissingRequired("MERCADOPAGO__WEBHOOK_SECRET"));
            }
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

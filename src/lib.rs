//! Payment Webhook Receiver - Mercado Pago payment confirmation service
//!
//! Receives signed payment notifications, resolves the authoritative payment
//! status and turns a pending intent into a confirmed user exactly once per
//! payment.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;

/// Initialize tracing from the server configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(config: &ServerConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

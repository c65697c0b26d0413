//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresIntentRepository` - Intents and confirmed users, transactional confirmation
//! - `PostgresPaymentRecordRepository` - Payment audit records with merge upserts

mod intent_repository;
mod payment_record_repository;

pub use intent_repository::PostgresIntentRepository;
pub use payment_record_repository::PostgresPaymentRecordRepository;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Opens the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(url)
        .await
}

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

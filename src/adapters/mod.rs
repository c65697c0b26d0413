//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes for the webhook and intent registration
//! - `memory` - In-memory store for development and tests
//! - `mercadopago` - Payment status queries against the Mercado Pago API
//! - `postgres` - PostgreSQL store

pub mod http;
pub mod memory;
pub mod mercadopago;
pub mod postgres;

pub use http::{app_router, PaymentAppState};
pub use memory::InMemoryPaymentStore;
pub use mercadopago::{MercadoPagoApiConfig, MercadoPagoStatusAdapter, MockPaymentStatusProvider};
pub use postgres::{PostgresIntentRepository, PostgresPaymentRecordRepository};

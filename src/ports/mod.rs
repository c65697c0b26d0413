//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PendingIntentRepository` - Intents and confirmed users, atomic confirmation
//! - `PaymentRecordRepository` - Per-payment audit records
//! - `PaymentStatusProvider` - Authoritative payment status from the provider

mod intent_repository;
mod payment_record_repository;
mod payment_status_provider;

pub use intent_repository::{ConfirmResult, PendingIntentRepository};
pub use payment_record_repository::{PaymentRecordRepository, UpsertResult};
pub use payment_status_provider::{PaymentDetails, PaymentStatusProvider, ProviderError};

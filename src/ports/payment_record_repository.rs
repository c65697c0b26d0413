//! PaymentRecordRepository port - Audit trail of processed payments.
//!
//! One record per provider payment id, rewritten on every delivery with
//! `PaymentRecord::merge` semantics.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId};
use crate::domain::payment::PaymentRecord;

/// Result of upserting a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    /// First record for this payment id.
    Inserted,
    /// Merged into an existing record.
    Merged,
}

/// Port for storing payment audit records.
#[async_trait]
pub trait PaymentRecordRepository: Send + Sync {
    /// Insert the record, or merge it into the stored one.
    async fn upsert(&self, record: PaymentRecord) -> Result<UpsertResult, DomainError>;

    /// Find the record for a payment id.
    async fn find(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError>;
}

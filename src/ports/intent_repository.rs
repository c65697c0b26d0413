//! PendingIntentRepository port - Interface for intent and user persistence.
//!
//! Intents and confirmed users live behind one port because confirming an
//! intent writes both atomically: the intent flips to paid and the user is
//! created in the same unit of work, or neither happens.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, IntentId, PaymentId};
use crate::domain::payment::{ConfirmedUser, Email, PendingIntent};

/// Outcome of a conditional intent confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    /// Intent marked paid. `user_created` is false when a user with the
    /// same email already existed and was kept.
    Confirmed { user_created: bool },

    /// Intent was already paid by another payment (lost race).
    IntentAlreadyConsumed,

    /// This payment id already consumed an intent.
    PaymentAlreadyApplied,
}

/// Port for storing payment intents and the users they produce.
///
/// Implementations must make `confirm` atomic and conditional: the intent is
/// only updated while still unpaid and while no other intent references the
/// same payment id.
#[async_trait]
pub trait PendingIntentRepository: Send + Sync {
    /// Persist a new intent.
    async fn save(&self, intent: &PendingIntent) -> Result<(), DomainError>;

    /// Find an intent by id.
    async fn find_by_id(&self, id: &IntentId) -> Result<Option<PendingIntent>, DomainError>;

    /// Find the oldest intent that has not been paid.
    async fn find_oldest_unpaid(&self) -> Result<Option<PendingIntent>, DomainError>;

    /// Find the intent consumed by `payment_id`, if any.
    async fn find_by_payment_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PendingIntent>, DomainError>;

    /// Mark the intent paid by `user.payment_id` and create `user`.
    ///
    /// # Errors
    ///
    /// `IntentNotFound` if no intent has this id.
    async fn confirm(
        &self,
        intent_id: &IntentId,
        user: &ConfirmedUser,
    ) -> Result<ConfirmResult, DomainError>;

    /// Find a confirmed user by email.
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<ConfirmedUser>, DomainError>;
}

//! Pending payment intent aggregate and its status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{IntentId, PaymentId, StateMachine, Timestamp, ValidationError};

use super::email::Email;

/// Lifecycle of a payment intent.
///
/// Declined payments do not move the intent; they only show up in the
/// payment audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Registered, waiting for an approved payment.
    Pending,

    /// Consumed by an approved payment. Terminal.
    Confirmed,
}

impl IntentStatus {
    /// Persisted form: the store only keeps a `paid` flag.
    pub fn from_paid(paid: bool) -> Self {
        if paid {
            IntentStatus::Confirmed
        } else {
            IntentStatus::Pending
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, IntentStatus::Confirmed)
    }
}

impl StateMachine for IntentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!((self, target), (IntentStatus::Pending, IntentStatus::Confirmed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            IntentStatus::Pending => vec![IntentStatus::Confirmed],
            IntentStatus::Confirmed => vec![],
        }
    }
}

/// A user's declared intent to pay, recorded before the redirect to the
/// provider's checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIntent {
    pub id: IntentId,
    pub email: Email,
    pub status: IntentStatus,
    /// Payment that consumed this intent, set together with `Confirmed`.
    pub payment_id: Option<PaymentId>,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
}

impl PendingIntent {
    /// Creates a fresh unpaid intent.
    pub fn new(email: Email) -> Self {
        Self {
            id: IntentId::new(),
            email,
            status: IntentStatus::Pending,
            payment_id: None,
            created_at: Timestamp::now(),
            paid_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }

    /// True while the intent can still be consumed by a payment.
    pub fn is_outstanding(&self) -> bool {
        !self.is_paid()
    }

    /// Marks the intent as paid by `payment_id`.
    ///
    /// # Errors
    ///
    /// Fails if the intent was already consumed.
    pub fn mark_paid(&mut self, payment_id: PaymentId, at: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(IntentStatus::Confirmed)?;
        self.payment_id = Some(payment_id);
        self.paid_at = Some(at);
        Ok(())
    }
}

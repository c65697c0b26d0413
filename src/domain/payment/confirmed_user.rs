//! Confirmed user created once an intent is paid.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{IntentId, PaymentId, Timestamp};

use super::email::Email;
use super::intent::PendingIntent;

/// Role given to users when no other role is configured.
pub const DEFAULT_USER_ROLE: &str = "member";

/// A user whose payment has been confirmed. Keyed by email and never
/// modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedUser {
    pub email: Email,
    pub role: String,
    pub intent_id: IntentId,
    pub payment_id: PaymentId,
    pub created_at: Timestamp,
}

impl ConfirmedUser {
    /// Derives the user record from the intent being consumed.
    pub fn from_intent(intent: &PendingIntent, payment_id: PaymentId, role: impl Into<String>) -> Self {
        Self {
            email: intent.email.clone(),
            role: role.into(),
            intent_id: intent.id,
            payment_id,
            created_at: Timestamp::now(),
        }
    }
}

//! Mercado Pago webhook notification payloads.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::PaymentId;

use super::payment_status::PaymentStatus;
use super::webhook_errors::WebhookError;

/// Notification kind that triggers payment processing.
pub const PAYMENT_KIND: &str = "payment";

/// Raw webhook body as sent by the provider.
///
/// Kept loose on purpose: only `type` is required up front, the rest is
/// checked once we know the notification is about a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type", alias = "topic")]
    pub kind: String,

    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub data: Option<NotificationData>,

    #[serde(default)]
    pub live_mode: Option<bool>,
}

/// The `data` object of a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default)]
    pub id: Option<ResourceId>,

    /// Embedded status. Only trusted when no status query is available.
    #[serde(default)]
    pub status: Option<String>,
}

/// Resource ids arrive as JSON strings or numbers depending on the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Text(String),
    Number(u64),
}

impl ResourceId {
    pub fn to_text(&self) -> String {
        match self {
            ResourceId::Text(s) => s.clone(),
            ResourceId::Number(n) => n.to_string(),
        }
    }
}

/// A validated notification, ready for the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Payment(PaymentNotification),
    Other { kind: String },
}

/// Payment notification fields the state machine works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub payment_id: PaymentId,
    pub embedded_status: Option<PaymentStatus>,
    pub action: Option<String>,
    pub live_mode: Option<bool>,
}

impl WebhookNotification {
    /// Parses the raw request body.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` when the body is not a JSON object with a `type`.
    pub fn parse(raw_body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(raw_body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    pub fn is_payment(&self) -> bool {
        self.kind.trim().eq_ignore_ascii_case(PAYMENT_KIND)
    }

    /// Validates the fields required for the notification's kind.
    ///
    /// # Errors
    ///
    /// `MissingField("data.id")` for a payment notification without an id.
    pub fn into_notification(self) -> Result<Notification, WebhookError> {
        if !self.is_payment() {
            return Ok(Notification::Other { kind: self.kind });
        }

        let data = self.data.unwrap_or_default();
        let raw_id = data.id.ok_or(WebhookError::MissingField("data.id"))?;
        let payment_id =
            PaymentId::new(raw_id.to_text()).map_err(|_| WebhookError::MissingField("data.id"))?;

        let embedded_status = data
            .status
            .filter(|s| !s.trim().is_empty())
            .map(|s| PaymentStatus::parse(&s));

        Ok(Notification::Payment(PaymentNotification {
            payment_id,
            embedded_status,
            action: self.action,
            live_mode: self.live_mode,
        }))
    }
}

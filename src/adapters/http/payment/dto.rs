//! HTTP DTOs (Data Transfer Objects) for payment endpoints.
//!
//! Field names follow the camelCase the checkout page and the provider
//! dashboard already expect.

use serde::{Deserialize, Serialize};

use crate::application::handlers::payment::NotificationOutcome;
use crate::domain::payment::PendingIntent;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to register a pending intent.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterIntentRequest {
    /// Email the confirmed user will be created with.
    #[serde(default)]
    pub email: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgment returned to the provider for every accepted notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub success: bool,
    /// What processing did, e.g. `confirmed` or `ignored`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookResponse {
    /// Acknowledgment for an upstream failure the handler could not absorb.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            outcome: "acknowledged".to_string(),
            payment_id: None,
            intent_id: None,
            status: None,
            message: Some(message.into()),
        }
    }
}

impl From<&NotificationOutcome> for WebhookResponse {
    fn from(outcome: &NotificationOutcome) -> Self {
        let (status, message) = match outcome {
            NotificationOutcome::Ignored { reason } => (None, Some(reason.clone())),
            NotificationOutcome::NotApproved { status, .. } => (Some(status.to_string()), None),
            NotificationOutcome::Confirmed { .. } | NotificationOutcome::AlreadyConfirmed { .. } => {
                (Some("approved".to_string()), None)
            }
            NotificationOutcome::NoOutstandingIntent { .. } => (
                Some("approved".to_string()),
                Some("no pending intent to confirm".to_string()),
            ),
            NotificationOutcome::Unverified { .. } => (
                None,
                Some("status query failed, recorded for reconciliation".to_string()),
            ),
        };

        Self {
            success: true,
            outcome: outcome.label().to_string(),
            payment_id: outcome.payment_id().map(|id| id.to_string()),
            intent_id: outcome.intent_id().map(|id| id.to_string()),
            status,
            message,
        }
    }
}

/// Response for a registered intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIntentResponse {
    pub success: bool,
    /// Pass this as the payment's `external_reference`.
    pub intent_id: String,
}

impl From<&PendingIntent> for RegisterIntentResponse {
    fn from(intent: &PendingIntent) -> Self {
        Self {
            success: true,
            intent_id: intent.id.to_string(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{IntentId, PaymentId};
    use crate::domain::payment::{Email, PaymentStatus};

    fn pid() -> PaymentId {
        PaymentId::new("123").unwrap()
    }

    #[test]
    fn confirmed_outcome_serializes_camel_case() {
        let intent_id = IntentId::new();
        let outcome = NotificationOutcome::Confirmed {
            payment_id: pid(),
            intent_id,
            email: Email::new("ana@example.com").unwrap(),
            user_created: true,
        };

        let json = serde_json::to_value(WebhookResponse::from(&outcome)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["outcome"], "confirmed");
        assert_eq!(json["paymentId"], "123");
        assert_eq!(json["intentId"], intent_id.to_string());
        assert_eq!(json["status"], "approved");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn ignored_outcome_carries_reason() {
        let outcome = NotificationOutcome::Ignored {
            reason: "unsupported notification type: merchant_order".to_string(),
        };

        let response = WebhookResponse::from(&outcome);

        assert!(response.success);
        assert_eq!(response.outcome, "ignored");
        assert!(response.payment_id.is_none());
        assert!(response.message.unwrap().contains("merchant_order"));
    }

    #[test]
    fn not_approved_outcome_reports_status() {
        let outcome = NotificationOutcome::NotApproved {
            payment_id: pid(),
            status: PaymentStatus::Rejected,
        };

        let response = WebhookResponse::from(&outcome);

        assert_eq!(response.status.as_deref(), Some("rejected"));
        assert!(response.intent_id.is_none());
    }

    #[test]
    fn register_response_uses_intent_id() {
        let intent = PendingIntent::new(Email::new("ana@example.com").unwrap());

        let json = serde_json::to_value(RegisterIntentResponse::from(&intent)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["intentId"], intent.id.to_string());
    }

    #[test]
    fn error_response_is_unsuccessful() {
        let json = serde_json::to_value(ErrorResponse::new("INVALID_SIGNATURE", "nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INVALID_SIGNATURE");
    }

    #[test]
    fn register_request_tolerates_missing_email() {
        let request: RegisterIntentRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_none());
    }
}

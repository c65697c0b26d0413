//! Provider payment statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a payment as reported by Mercado Pago.
///
/// Unrecognised values are preserved in `Other` so the audit record never
/// loses what the provider said.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    /// Local marker: the status query failed and the payment awaits
    /// manual reconciliation. Never sent by the provider.
    Unverified,
    Other(String),
}

impl PaymentStatus {
    /// Parses a provider status string. Never fails.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "approved" => PaymentStatus::Approved,
            "authorized" => PaymentStatus::Authorized,
            "in_process" => PaymentStatus::InProcess,
            "in_mediation" => PaymentStatus::InMediation,
            "rejected" => PaymentStatus::Rejected,
            "cancelled" => PaymentStatus::Cancelled,
            "refunded" => PaymentStatus::Refunded,
            "charged_back" => PaymentStatus::ChargedBack,
            "unverified" => PaymentStatus::Unverified,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Authorized => "authorized",
            PaymentStatus::InProcess => "in_process",
            PaymentStatus::InMediation => "in_mediation",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::ChargedBack => "charged_back",
            PaymentStatus::Unverified => "unverified",
            PaymentStatus::Other(s) => s,
        }
    }

    /// Only an approved payment confirms an intent.
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentStatus::Approved)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        PaymentStatus::parse(&value)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses_case_insensitively() {
        assert_eq!(PaymentStatus::parse("approved"), PaymentStatus::Approved);
        assert_eq!(PaymentStatus::parse("APPROVED"), PaymentStatus::Approved);
        assert_eq!(PaymentStatus::parse(" in_process "), PaymentStatus::InProcess);
        assert_eq!(PaymentStatus::parse("charged_back"), PaymentStatus::ChargedBack);
    }

    #[test]
    fn keeps_unknown_statuses() {
        let status = PaymentStatus::parse("partially_refunded");
        assert_eq!(status, PaymentStatus::Other("partially_refunded".to_string()));
        assert_eq!(status.as_str(), "partially_refunded");
    }

    #[test]
    fn only_approved_is_approved() {
        assert!(PaymentStatus::Approved.is_approved());
        assert!(!PaymentStatus::Authorized.is_approved());
        assert!(!PaymentStatus::Pending.is_approved());
        assert!(!PaymentStatus::Unverified.is_approved());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&PaymentStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");

        let parsed: PaymentStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(parsed, PaymentStatus::Refunded);
    }
}

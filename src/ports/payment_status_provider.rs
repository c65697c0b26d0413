//! Payment status provider port.
//!
//! Queries the payment provider for the authoritative state of a payment.
//! The webhook body is only a hint; this is the ground truth.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::PaymentId;
use crate::domain::payment::{PaymentStatus, WebhookError};

/// Payment as reported by the provider's API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    pub id: PaymentId,
    pub status: PaymentStatus,

    /// Correlation id set at checkout. Carries our intent id.
    pub external_reference: Option<String>,

    pub live_mode: Option<bool>,

    /// Full response document, kept for the audit record.
    pub raw: serde_json::Value,
}

/// Errors from the provider status query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("status query timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("payment {0} not found")]
    NotFound(String),

    #[error("provider rejected credentials")]
    Unauthorized,

    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Network(_) => true,
            ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
            ProviderError::NotFound(_) | ProviderError::Unauthorized | ProviderError::Decode(_) => {
                false
            }
        }
    }
}

impl From<ProviderError> for WebhookError {
    fn from(err: ProviderError) -> Self {
        WebhookError::Upstream(err.to_string())
    }
}

/// Port for querying payment status from the provider.
#[async_trait]
pub trait PaymentStatusProvider: Send + Sync {
    /// Fetch the current state of a payment.
    async fn payment_details(&self, payment_id: &PaymentId) -> Result<PaymentDetails, ProviderError>;
}

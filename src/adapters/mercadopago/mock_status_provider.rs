//! Mock payment status provider for testing.
//!
//! Supports pre-configured payments, error injection and call tracking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::PaymentId;
use crate::domain::payment::PaymentStatus;
use crate::ports::{PaymentDetails, PaymentStatusProvider, ProviderError};

/// Mock payment status provider.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentStatusProvider::new();
/// mock.add_payment("123", PaymentStatus::Approved, None);
/// mock.set_error(ProviderError::Timeout("10s".into()));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentStatusProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    payments: HashMap<String, PaymentDetails>,
    next_error: Option<ProviderError>,
    queried: Vec<String>,
}

impl MockPaymentStatusProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a payment to the "provider".
    ///
    /// Ids that fail `PaymentId` validation are ignored.
    pub fn add_payment(
        &self,
        payment_id: &str,
        status: PaymentStatus,
        external_reference: Option<String>,
    ) {
        let Ok(id) = PaymentId::new(payment_id) else {
            return;
        };
        let raw = serde_json::json!({
            "id": id.as_str(),
            "status": status.as_str(),
            "external_reference": external_reference,
            "live_mode": true,
        });
        self.state().payments.insert(
            id.as_str().to_string(),
            PaymentDetails {
                id,
                status,
                external_reference,
                live_mode: Some(true),
                raw,
            },
        );
    }

    /// Add fully specified payment details.
    pub fn add_details(&self, details: PaymentDetails) {
        self.state()
            .payments
            .insert(details.id.as_str().to_string(), details);
    }

    /// Set an error to return on every call until cleared.
    pub fn set_error(&self, error: ProviderError) {
        self.state().next_error = Some(error);
    }

    pub fn clear_error(&self) {
        self.state().next_error = None;
    }

    /// Payment ids queried so far, in call order.
    pub fn queried(&self) -> Vec<String> {
        self.state().queried.clone()
    }
}

#[async_trait]
impl PaymentStatusProvider for MockPaymentStatusProvider {
    async fn payment_details(&self, payment_id: &PaymentId) -> Result<PaymentDetails, ProviderError> {
        let mut state = self.state();
        state.queried.push(payment_id.as_str().to_string());

        if let Some(error) = state.next_error.clone() {
            return Err(error);
        }

        state
            .payments
            .get(payment_id.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(payment_id.to_string()))
    }
}

//! Payment audit record with merge-upsert semantics.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{IntentId, PaymentId, Timestamp};

use super::payment_status::PaymentStatus;

/// Latest known state of a provider payment, one record per payment id.
///
/// Rewritten on every delivery. `merge` defines what "rewritten" means:
/// status, time and reconciliation flag take the newest value, while
/// optional fields are only replaced when the update carries a value. An
/// `Unverified` update never downgrades a resolved status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub processed_at: Timestamp,
    pub intent_id: Option<IntentId>,
    pub live_mode: Option<bool>,
    pub needs_reconciliation: bool,
    pub raw_notification: Option<String>,

    /// Payment document returned by the provider status query.
    pub provider_payload: Option<serde_json::Value>,
}

impl PaymentRecord {
    pub fn new(payment_id: PaymentId, status: PaymentStatus) -> Self {
        Self {
            payment_id,
            status,
            processed_at: Timestamp::now(),
            intent_id: None,
            live_mode: None,
            needs_reconciliation: false,
            raw_notification: None,
            provider_payload: None,
        }
    }

    /// Record for a payment whose status could not be resolved.
    pub fn unverified(payment_id: PaymentId) -> Self {
        Self {
            needs_reconciliation: true,
            ..Self::new(payment_id, PaymentStatus::Unverified)
        }
    }

    pub fn with_intent(mut self, intent_id: Option<IntentId>) -> Self {
        self.intent_id = intent_id;
        self
    }

    pub fn with_live_mode(mut self, live_mode: Option<bool>) -> Self {
        self.live_mode = live_mode;
        self
    }

    pub fn with_raw_notification(mut self, raw: impl Into<String>) -> Self {
        self.raw_notification = Some(raw.into());
        self
    }

    pub fn with_provider_payload(mut self, payload: Option<serde_json::Value>) -> Self {
        self.provider_payload = payload;
        self
    }

    /// Applies a newer delivery on top of the stored record.
    pub fn merge(&mut self, update: PaymentRecord) {
        debug_assert_eq!(self.payment_id, update.payment_id);

        // A failed status query carries no news about the payment itself.
        if update.status != PaymentStatus::Unverified {
            self.status = update.status;
            self.needs_reconciliation = update.needs_reconciliation;
        }
        self.processed_at = update.processed_at;

        if update.intent_id.is_some() {
            self.intent_id = update.intent_id;
        }
        if update.live_mode.is_some() {
            self.live_mode = update.live_mode;
        }
        if update.raw_notification.is_some() {
            self.raw_notification = update.raw_notification;
        }
        if update.provider_payload.is_some() {
            self.provider_payload = update.provider_payload;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> PaymentId {
        PaymentId::new("42").unwrap()
    }

    #[test]
    fn unverified_record_needs_reconciliation() {
        let record = PaymentRecord::unverified(pid());

        assert_eq!(record.status, PaymentStatus::Unverified);
        assert!(record.needs_reconciliation);
    }

    #[test]
    fn merge_overwrites_status_and_time() {
        let mut stored = PaymentRecord::new(pid(), PaymentStatus::Pending);
        let update = PaymentRecord::new(pid(), PaymentStatus::Approved);
        let update_time = update.processed_at;

        stored.merge(update);

        assert_eq!(stored.status, PaymentStatus::Approved);
        assert_eq!(stored.processed_at, update_time);
    }

    #[test]
    fn merge_keeps_fields_missing_from_update() {
        let intent_id = IntentId::new();
        let mut stored = PaymentRecord::new(pid(), PaymentStatus::Approved)
            .with_intent(Some(intent_id))
            .with_live_mode(Some(true))
            .with_raw_notification("{\"type\":\"payment\"}");

        stored.merge(PaymentRecord::new(pid(), PaymentStatus::Approved));

        assert_eq!(stored.intent_id, Some(intent_id));
        assert_eq!(stored.live_mode, Some(true));
        assert_eq!(
            stored.raw_notification.as_deref(),
            Some("{\"type\":\"payment\"}")
        );
    }

    #[test]
    fn merge_clears_reconciliation_once_resolved() {
        let mut stored = PaymentRecord::unverified(pid());

        stored.merge(PaymentRecord::new(pid(), PaymentStatus::Rejected));

        assert!(!stored.needs_reconciliation);
        assert_eq!(stored.status, PaymentStatus::Rejected);
    }

    #[test]
    fn unverified_update_keeps_resolved_status() {
        let mut stored = PaymentRecord::new(pid(), PaymentStatus::Approved);
        let update = PaymentRecord::unverified(pid()).with_live_mode(Some(false));
        let update_time = update.processed_at;

        stored.merge(update);

        assert_eq!(stored.status, PaymentStatus::Approved);
        assert!(!stored.needs_reconciliation);
        assert_eq!(stored.live_mode, Some(false));
        assert_eq!(stored.processed_at, update_time);
    }

    #[test]
    fn unverified_update_keeps_unverified_record_flagged() {
        let mut stored = PaymentRecord::unverified(pid());

        stored.merge(PaymentRecord::unverified(pid()));

        assert_eq!(stored.status, PaymentStatus::Unverified);
        assert!(stored.needs_reconciliation);
    }

    #[test]
    fn merge_keeps_provider_payload_when_update_has_none() {
        let payload = serde_json::json!({"id": 42, "status": "approved"});
        let mut stored = PaymentRecord::new(pid(), PaymentStatus::Approved)
            .with_provider_payload(Some(payload.clone()));

        stored.merge(PaymentRecord::unverified(pid()));

        assert_eq!(stored.provider_payload, Some(payload));
    }
}

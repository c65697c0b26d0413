//! In-Memory Payment Store Adapter
//!
//! Implements both repository ports over a single lock, so `confirm` is
//! atomic. Used for development and tests.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, IntentId, PaymentId};
use crate::domain::payment::{ConfirmedUser, Email, PaymentRecord, PendingIntent};
use crate::ports::{
    ConfirmResult, PaymentRecordRepository, PendingIntentRepository, UpsertResult,
};

#[derive(Debug, Default)]
struct StoreState {
    /// Insertion order breaks `created_at` ties.
    intents: Vec<PendingIntent>,
    users: HashMap<String, ConfirmedUser>,
    records: HashMap<String, PaymentRecord>,
}

/// In-memory store for intents, users and payment records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStore {
    state: Arc<RwLock<StoreState>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::database("in-memory store unavailable"));
        }
        Ok(())
    }

    /// All stored intents, oldest first.
    pub async fn intents(&self) -> Vec<PendingIntent> {
        self.state.read().await.intents.clone()
    }

    /// Number of confirmed users.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// Number of payment records.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}

#[async_trait]
impl PendingIntentRepository for InMemoryPaymentStore {
    async fn save(&self, intent: &PendingIntent) -> Result<(), DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.intents.iter_mut().find(|i| i.id == intent.id) {
            Some(existing) => *existing = intent.clone(),
            None => state.intents.push(intent.clone()),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &IntentId) -> Result<Option<PendingIntent>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.intents.iter().find(|i| &i.id == id).cloned())
    }

    async fn find_oldest_unpaid(&self) -> Result<Option<PendingIntent>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .intents
            .iter()
            .filter(|i| i.is_outstanding())
            .min_by_key(|i| i.created_at)
            .cloned())
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PendingIntent>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .intents
            .iter()
            .find(|i| i.payment_id.as_ref() == Some(payment_id))
            .cloned())
    }

    async fn confirm(
        &self,
        intent_id: &IntentId,
        user: &ConfirmedUser,
    ) -> Result<ConfirmResult, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if state
            .intents
            .iter()
            .any(|i| i.payment_id.as_ref() == Some(&user.payment_id))
        {
            return Ok(ConfirmResult::PaymentAlreadyApplied);
        }

        let intent = state
            .intents
            .iter_mut()
            .find(|i| &i.id == intent_id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::IntentNotFound, "intent not found")
                    .with_detail("intent_id", intent_id.to_string())
            })?;

        if intent.is_paid() {
            return Ok(ConfirmResult::IntentAlreadyConsumed);
        }

        intent
            .mark_paid(user.payment_id.clone(), user.created_at)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;

        let key = user.email.as_str().to_string();
        let user_created = !state.users.contains_key(&key);
        if user_created {
            state.users.insert(key, user.clone());
        }

        Ok(ConfirmResult::Confirmed { user_created })
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<ConfirmedUser>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.users.get(email.as_str()).cloned())
    }
}

#[async_trait]
impl PaymentRecordRepository for InMemoryPaymentStore {
    async fn upsert(&self, record: PaymentRecord) -> Result<UpsertResult, DomainError> {
        self.check_available()?;
        let mut state = self.state.write().await;
        match state.records.entry(record.payment_id.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().merge(record);
                Ok(UpsertResult::Merged)
            }
            Entry::Vacant(entry) => {
                entry.insert(record);
                Ok(UpsertResult::Inserted)
            }
        }
    }

    async fn find(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.records.get(payment_id.as_str()).cloned())
    }
}

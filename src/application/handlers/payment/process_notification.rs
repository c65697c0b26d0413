//! ProcessNotificationHandler - Command handler for verified Mercado Pago notifications.
//!
//! Resolves the true payment status, consumes one outstanding intent for an
//! approved payment and records the payment for audit. Safe to run any number
//! of times for the same payment.

use std::sync::Arc;

use crate::domain::foundation::{IntentId, PaymentId};
use crate::domain::payment::{
    ConfirmedUser, Email, Notification, PaymentNotification, PaymentRecord, PaymentStatus,
    PendingIntent, WebhookError, DEFAULT_USER_ROLE,
};
use crate::ports::{
    ConfirmResult, PaymentRecordRepository, PaymentStatusProvider, PendingIntentRepository,
};

/// Selection is retried this many times when a concurrent delivery wins the
/// same intent.
const MAX_CONFIRM_ATTEMPTS: usize = 3;

/// Command to process a verified notification.
#[derive(Debug, Clone)]
pub struct ProcessNotificationCommand {
    pub notification: Notification,

    /// Original body, kept on the payment record.
    pub raw_body: Option<String>,
}

/// What processing did with the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Not a payment notification, or filtered out. No state change.
    Ignored { reason: String },

    /// Payment approved, intent consumed.
    Confirmed {
        payment_id: PaymentId,
        intent_id: IntentId,
        email: Email,
        user_created: bool,
    },

    /// Payment had already consumed an intent. No state change.
    AlreadyConfirmed {
        payment_id: PaymentId,
        intent_id: Option<IntentId>,
    },

    /// Payment approved but no intent is waiting for it.
    NoOutstandingIntent { payment_id: PaymentId },

    /// Payment resolved to a non-approved status. Only the record changes.
    NotApproved {
        payment_id: PaymentId,
        status: PaymentStatus,
    },

    /// Status query failed. Recorded for reconciliation.
    Unverified { payment_id: PaymentId },
}

impl NotificationOutcome {
    pub fn payment_id(&self) -> Option<&PaymentId> {
        match self {
            NotificationOutcome::Ignored { .. } => None,
            NotificationOutcome::Confirmed { payment_id, .. }
            | NotificationOutcome::AlreadyConfirmed { payment_id, .. }
            | NotificationOutcome::NoOutstandingIntent { payment_id }
            | NotificationOutcome::NotApproved { payment_id, .. }
            | NotificationOutcome::Unverified { payment_id } => Some(payment_id),
        }
    }

    pub fn intent_id(&self) -> Option<IntentId> {
        match self {
            NotificationOutcome::Confirmed { intent_id, .. } => Some(*intent_id),
            NotificationOutcome::AlreadyConfirmed { intent_id, .. } => *intent_id,
            _ => None,
        }
    }

    /// Short label for responses and logs.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationOutcome::Ignored { .. } => "ignored",
            NotificationOutcome::Confirmed { .. } => "confirmed",
            NotificationOutcome::AlreadyConfirmed { .. } => "already_confirmed",
            NotificationOutcome::NoOutstandingIntent { .. } => "no_outstanding_intent",
            NotificationOutcome::NotApproved { .. } => "not_approved",
            NotificationOutcome::Unverified { .. } => "unverified",
        }
    }
}

/// Handler behavior switches.
#[derive(Debug, Clone)]
pub struct ProcessNotificationConfig {
    /// Ignore notifications flagged `live_mode: false`.
    pub require_live_mode: bool,

    /// Role assigned to confirmed users.
    pub confirmed_user_role: String,
}

impl Default for ProcessNotificationConfig {
    fn default() -> Self {
        Self {
            require_live_mode: false,
            confirmed_user_role: DEFAULT_USER_ROLE.to_string(),
        }
    }
}

/// Status as resolved for one delivery.
struct ResolvedPayment {
    status: PaymentStatus,
    external_reference: Option<String>,
    live_mode: Option<bool>,
    provider_payload: Option<serde_json::Value>,
}

/// Handler for verified payment notifications.
///
/// Without a status provider the embedded body status is trusted, which is
/// logged as the weaker mode on every delivery.
pub struct ProcessNotificationHandler {
    intents: Arc<dyn PendingIntentRepository>,
    records: Arc<dyn PaymentRecordRepository>,
    status_provider: Option<Arc<dyn PaymentStatusProvider>>,
    config: ProcessNotificationConfig,
}

impl ProcessNotificationHandler {
    pub fn new(
        intents: Arc<dyn PendingIntentRepository>,
        records: Arc<dyn PaymentRecordRepository>,
        status_provider: Option<Arc<dyn PaymentStatusProvider>>,
        config: ProcessNotificationConfig,
    ) -> Self {
        Self {
            intents,
            records,
            status_provider,
            config,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessNotificationCommand,
    ) -> Result<NotificationOutcome, WebhookError> {
        // 1. Filter
        let payment = match cmd.notification {
            Notification::Payment(payment) => payment,
            Notification::Other { kind } => {
                tracing::info!(notification_type = %kind, "Ignoring non-payment notification");
                return Ok(NotificationOutcome::Ignored {
                    reason: format!("unsupported notification type: {}", kind),
                });
            }
        };

        if self.is_test_mode(payment.live_mode) {
            tracing::info!(payment_id = %payment.payment_id, "Ignoring test-mode notification");
            return Ok(NotificationOutcome::Ignored {
                reason: "test-mode notification".to_string(),
            });
        }

        // 2. Resolve ground truth
        let Some(resolved) = self.resolve_status(&payment).await? else {
            let record = PaymentRecord::unverified(payment.payment_id.clone())
                .with_live_mode(payment.live_mode);
            self.upsert_record(record, cmd.raw_body).await?;
            return Ok(NotificationOutcome::Unverified {
                payment_id: payment.payment_id,
            });
        };

        if self.is_test_mode(resolved.live_mode) {
            tracing::info!(payment_id = %payment.payment_id, "Ignoring test-mode payment");
            return Ok(NotificationOutcome::Ignored {
                reason: "test-mode payment".to_string(),
            });
        }

        tracing::info!(
            payment_id = %payment.payment_id,
            status = %resolved.status,
            action = payment.action.as_deref().unwrap_or(""),
            "Payment status resolved"
        );

        // 3 + 4. Consume an intent for approved payments
        let outcome = if resolved.status.is_approved() {
            self.confirm_payment(&payment.payment_id, resolved.external_reference.as_deref())
                .await?
        } else {
            NotificationOutcome::NotApproved {
                payment_id: payment.payment_id.clone(),
                status: resolved.status.clone(),
            }
        };

        // 5. Audit record
        let record = PaymentRecord::new(payment.payment_id, resolved.status)
            .with_intent(outcome.intent_id())
            .with_live_mode(resolved.live_mode)
            .with_provider_payload(resolved.provider_payload);
        self.upsert_record(record, cmd.raw_body).await?;

        Ok(outcome)
    }

    fn is_test_mode(&self, live_mode: Option<bool>) -> bool {
        self.config.require_live_mode && live_mode == Some(false)
    }

    /// Returns `None` when the status query failed and the payment must be
    /// reconciled later.
    async fn resolve_status(
        &self,
        payment: &PaymentNotification,
    ) -> Result<Option<ResolvedPayment>, WebhookError> {
        let Some(provider) = &self.status_provider else {
            let status = payment
                .embedded_status
                .clone()
                .ok_or(WebhookError::MissingField("data.status"))?;
            tracing::warn!(
                payment_id = %payment.payment_id,
                status = %status,
                "No access token configured, trusting notification body status"
            );
            return Ok(Some(ResolvedPayment {
                status,
                external_reference: None,
                live_mode: payment.live_mode,
                provider_payload: None,
            }));
        };

        match provider.payment_details(&payment.payment_id).await {
            Ok(details) => Ok(Some(ResolvedPayment {
                status: details.status,
                external_reference: details.external_reference,
                live_mode: details.live_mode.or(payment.live_mode),
                provider_payload: Some(details.raw),
            })),
            Err(err) => {
                tracing::warn!(
                    payment_id = %payment.payment_id,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Payment status query failed, recording for reconciliation"
                );
                Ok(None)
            }
        }
    }

    async fn confirm_payment(
        &self,
        payment_id: &PaymentId,
        external_reference: Option<&str>,
    ) -> Result<NotificationOutcome, WebhookError> {
        if let Some(consumed) = self.intents.find_by_payment_id(payment_id).await? {
            tracing::info!(
                payment_id = %payment_id,
                intent_id = %consumed.id,
                "Payment already confirmed, skipping"
            );
            return Ok(NotificationOutcome::AlreadyConfirmed {
                payment_id: payment_id.clone(),
                intent_id: Some(consumed.id),
            });
        }

        for attempt in 1..=MAX_CONFIRM_ATTEMPTS {
            let Some(intent) = self.select_intent(external_reference).await? else {
                tracing::info!(payment_id = %payment_id, "No outstanding intent for approved payment");
                return Ok(NotificationOutcome::NoOutstandingIntent {
                    payment_id: payment_id.clone(),
                });
            };

            let user =
                ConfirmedUser::from_intent(&intent, payment_id.clone(), &self.config.confirmed_user_role);

            match self.intents.confirm(&intent.id, &user).await? {
                ConfirmResult::Confirmed { user_created } => {
                    tracing::info!(
                        payment_id = %payment_id,
                        intent_id = %intent.id,
                        user_created,
                        "Intent confirmed"
                    );
                    return Ok(NotificationOutcome::Confirmed {
                        payment_id: payment_id.clone(),
                        intent_id: intent.id,
                        email: intent.email,
                        user_created,
                    });
                }
                ConfirmResult::PaymentAlreadyApplied => {
                    let intent_id = self
                        .intents
                        .find_by_payment_id(payment_id)
                        .await?
                        .map(|i| i.id);
                    tracing::info!(payment_id = %payment_id, "Payment confirmed by a concurrent delivery");
                    return Ok(NotificationOutcome::AlreadyConfirmed {
                        payment_id: payment_id.clone(),
                        intent_id,
                    });
                }
                ConfirmResult::IntentAlreadyConsumed => {
                    tracing::debug!(
                        payment_id = %payment_id,
                        intent_id = %intent.id,
                        attempt,
                        "Intent consumed concurrently, selecting again"
                    );
                }
            }
        }

        tracing::warn!(payment_id = %payment_id, "Gave up selecting an intent after repeated conflicts");
        Err(WebhookError::Store(format!(
            "could not consume an intent for payment {} after {} attempts",
            payment_id, MAX_CONFIRM_ATTEMPTS
        )))
    }

    /// The intent named by the external reference, else the oldest unpaid one.
    ///
    /// A reference to an intent that is already paid selects nothing: the
    /// payment belongs to that user and must not consume someone else's intent.
    async fn select_intent(
        &self,
        external_reference: Option<&str>,
    ) -> Result<Option<PendingIntent>, WebhookError> {
        if let Some(reference) = external_reference {
            match reference.parse::<IntentId>() {
                Ok(intent_id) => match self.intents.find_by_id(&intent_id).await? {
                    Some(intent) if intent.is_outstanding() => return Ok(Some(intent)),
                    Some(_) => {
                        tracing::info!(intent_id = %intent_id, "Referenced intent already paid");
                        return Ok(None);
                    }
                    None => {
                        tracing::warn!(intent_id = %intent_id, "Referenced intent not found, using oldest unpaid");
                    }
                },
                Err(_) => {
                    tracing::debug!(external_reference = reference, "External reference is not an intent id");
                }
            }
        }

        Ok(self.intents.find_oldest_unpaid().await?)
    }

    async fn upsert_record(
        &self,
        record: PaymentRecord,
        raw_body: Option<String>,
    ) -> Result<(), WebhookError> {
        let record = match raw_body {
            Some(raw) => record.with_raw_notification(raw),
            None => record,
        };
        let payment_id = record.payment_id.clone();
        let status = record.status.clone();

        let result = self.records.upsert(record).await?;
        tracing::debug!(payment_id = %payment_id, status = %status, result = ?result, "Payment record upserted");
        Ok(())
    }
}

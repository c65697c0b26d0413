//! PostgreSQL implementation of PaymentRecordRepository.

use crate::domain::foundation::{DomainError, ErrorCode, IntentId, PaymentId, Timestamp};
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::ports::{PaymentRecordRepository, UpsertResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the PaymentRecordRepository port.
pub struct PostgresPaymentRecordRepository {
    pool: PgPool,
}

impl PostgresPaymentRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRecordRow {
    payment_id: String,
    status: String,
    processed_at: DateTime<Utc>,
    intent_id: Option<Uuid>,
    live_mode: Option<bool>,
    needs_reconciliation: bool,
    raw_notification: Option<String>,
    provider_payload: Option<serde_json::Value>,
}

impl TryFrom<PaymentRecordRow> for PaymentRecord {
    type Error = DomainError;

    fn try_from(row: PaymentRecordRow) -> Result<Self, Self::Error> {
        Ok(PaymentRecord {
            payment_id: PaymentId::new(row.payment_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid payment_id: {}", e))
            })?,
            status: PaymentStatus::parse(&row.status),
            processed_at: Timestamp::from_datetime(row.processed_at),
            intent_id: row.intent_id.map(IntentId::from_uuid),
            live_mode: row.live_mode,
            needs_reconciliation: row.needs_reconciliation,
            raw_notification: row.raw_notification,
            provider_payload: row.provider_payload,
        })
    }
}

#[async_trait]
impl PaymentRecordRepository for PostgresPaymentRecordRepository {
    async fn upsert(&self, record: PaymentRecord) -> Result<UpsertResult, DomainError> {
        // Same rules as PaymentRecord::merge. Optional columns keep their
        // stored value when the update has none, and an unverified update
        // leaves status and reconciliation flag alone.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO payment_records (
                payment_id, status, processed_at, intent_id, live_mode,
                needs_reconciliation, raw_notification, provider_payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (payment_id) DO UPDATE SET
                status = CASE WHEN EXCLUDED.status = 'unverified'
                    THEN payment_records.status ELSE EXCLUDED.status END,
                needs_reconciliation = CASE WHEN EXCLUDED.status = 'unverified'
                    THEN payment_records.needs_reconciliation
                    ELSE EXCLUDED.needs_reconciliation END,
                processed_at = EXCLUDED.processed_at,
                intent_id = COALESCE(EXCLUDED.intent_id, payment_records.intent_id),
                live_mode = COALESCE(EXCLUDED.live_mode, payment_records.live_mode),
                raw_notification = COALESCE(EXCLUDED.raw_notification, payment_records.raw_notification),
                provider_payload = COALESCE(EXCLUDED.provider_payload, payment_records.provider_payload)
            RETURNING (xmax = 0)
            "#,
        )
        .bind(record.payment_id.as_str())
        .bind(record.status.as_str())
        .bind(record.processed_at.as_datetime())
        .bind(record.intent_id.as_ref().map(IntentId::as_uuid))
        .bind(record.live_mode)
        .bind(record.needs_reconciliation)
        .bind(record.raw_notification.as_deref())
        .bind(record.provider_payload.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to upsert payment record: {}", e),
            )
        })?;

        Ok(if inserted {
            UpsertResult::Inserted
        } else {
            UpsertResult::Merged
        })
    }

    async fn find(&self, payment_id: &PaymentId) -> Result<Option<PaymentRecord>, DomainError> {
        let row: Option<PaymentRecordRow> = sqlx::query_as(
            r#"
            SELECT payment_id, status, processed_at, intent_id, live_mode,
                   needs_reconciliation, raw_notification, provider_payload
            FROM payment_records
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to find payment record: {}", e),
            )
        })?;

        row.map(PaymentRecord::try_from).transpose()
    }
}

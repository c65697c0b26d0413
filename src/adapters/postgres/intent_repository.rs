//! PostgreSQL implementation of PendingIntentRepository.
//!
//! Confirmation runs in one transaction: a conditional `UPDATE ... WHERE
//! paid = FALSE` consumes the intent, and the unique constraint on
//! `payment_id` stops a payment from consuming a second intent.

use crate::domain::foundation::{DomainError, ErrorCode, IntentId, PaymentId, Timestamp};
use crate::domain::payment::{ConfirmedUser, Email, IntentStatus, PendingIntent};
use crate::ports::{ConfirmResult, PendingIntentRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Unique constraint on `pending_intents.payment_id`.
const PAYMENT_ID_CONSTRAINT: &str = "pending_intents_payment_id_key";

/// PostgreSQL implementation of the PendingIntentRepository port.
pub struct PostgresIntentRepository {
    pool: PgPool,
}

impl PostgresIntentRepository {
    /// Creates a new PostgresIntentRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a pending intent.
#[derive(Debug, sqlx::FromRow)]
struct IntentRow {
    id: Uuid,
    email: String,
    paid: bool,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<IntentRow> for PendingIntent {
    type Error = DomainError;

    fn try_from(row: IntentRow) -> Result<Self, Self::Error> {
        let email = Email::new(row.email).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored email: {}", e))
        })?;
        let payment_id = row
            .payment_id
            .map(PaymentId::new)
            .transpose()
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid payment_id: {}", e))
            })?;

        Ok(PendingIntent {
            id: IntentId::from_uuid(row.id),
            email,
            status: IntentStatus::from_paid(row.paid),
            payment_id,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
        })
    }
}

/// Database row representation of a confirmed user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    email: String,
    role: String,
    intent_id: Uuid,
    payment_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for ConfirmedUser {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(ConfirmedUser {
            email: Email::new(row.email).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored email: {}", e))
            })?,
            role: row.role,
            intent_id: IntentId::from_uuid(row.intent_id),
            payment_id: PaymentId::new(row.payment_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid payment_id: {}", e))
            })?,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

fn is_constraint_violation(e: &sqlx::Error, constraint: &str) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(constraint),
        _ => false,
    }
}

const SELECT_INTENT: &str = r#"
    SELECT id, email, paid, payment_id, created_at, paid_at
    FROM pending_intents
"#;

#[async_trait]
impl PendingIntentRepository for PostgresIntentRepository {
    async fn save(&self, intent: &PendingIntent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO pending_intents (id, email, paid, payment_id, created_at, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(intent.id.as_uuid())
        .bind(intent.email.as_str())
        .bind(intent.is_paid())
        .bind(intent.payment_id.as_ref().map(PaymentId::as_str))
        .bind(intent.created_at.as_datetime())
        .bind(intent.paid_at.as_ref().map(Timestamp::as_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save intent", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &IntentId) -> Result<Option<PendingIntent>, DomainError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_INTENT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find intent", e))?;

        row.map(PendingIntent::try_from).transpose()
    }

    async fn find_oldest_unpaid(&self) -> Result<Option<PendingIntent>, DomainError> {
        let row: Option<IntentRow> = sqlx::query_as(&format!(
            "{} WHERE paid = FALSE ORDER BY created_at ASC, id ASC LIMIT 1",
            SELECT_INTENT
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find unpaid intent", e))?;

        row.map(PendingIntent::try_from).transpose()
    }

    async fn find_by_payment_id(
        &self,
        payment_id: &PaymentId,
    ) -> Result<Option<PendingIntent>, DomainError> {
        let row: Option<IntentRow> =
            sqlx::query_as(&format!("{} WHERE payment_id = $1", SELECT_INTENT))
                .bind(payment_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find intent by payment", e))?;

        row.map(PendingIntent::try_from).transpose()
    }

    async fn confirm(
        &self,
        intent_id: &IntentId,
        user: &ConfirmedUser,
    ) -> Result<ConfirmResult, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;

        let update = sqlx::query(
            r#"
            UPDATE pending_intents
            SET paid = TRUE, payment_id = $2, paid_at = $3
            WHERE id = $1 AND paid = FALSE
            "#,
        )
        .bind(intent_id.as_uuid())
        .bind(user.payment_id.as_str())
        .bind(user.created_at.as_datetime())
        .execute(&mut *tx)
        .await;

        let rows_affected = match update {
            Ok(result) => result.rows_affected(),
            Err(e) if is_constraint_violation(&e, PAYMENT_ID_CONSTRAINT) => {
                return Ok(ConfirmResult::PaymentAlreadyApplied);
            }
            Err(e) => return Err(db_error("Failed to confirm intent", e)),
        };

        if rows_affected == 0 {
            let (exists, payment_used): (bool, bool) = sqlx::query_as(
                r#"
                SELECT
                    EXISTS (SELECT 1 FROM pending_intents WHERE id = $1),
                    EXISTS (SELECT 1 FROM pending_intents WHERE payment_id = $2)
                "#,
            )
            .bind(intent_id.as_uuid())
            .bind(user.payment_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to inspect intent", e))?;

            return if payment_used {
                Ok(ConfirmResult::PaymentAlreadyApplied)
            } else if exists {
                Ok(ConfirmResult::IntentAlreadyConsumed)
            } else {
                Err(DomainError::new(ErrorCode::IntentNotFound, "intent not found")
                    .with_detail("intent_id", intent_id.to_string()))
            };
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO confirmed_users (email, role, intent_id, payment_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(user.email.as_str())
        .bind(&user.role)
        .bind(user.intent_id.as_uuid())
        .bind(user.payment_id.as_str())
        .bind(user.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to create confirmed user", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(ConfirmResult::Confirmed {
            user_created: inserted.rows_affected() == 1,
        })
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<ConfirmedUser>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT email, role, intent_id, payment_id, created_at
            FROM confirmed_users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find user", e))?;

        row.map(ConfirmedUser::try_from).transpose()
    }
}

//! Payment domain module.
//!
//! Handles payment intents, confirmed users, and Mercado Pago webhook
//! notifications.
//!
//! # Module Structure
//!
//! - `intent` - PendingIntent aggregate and IntentStatus state machine
//! - `confirmed_user` - User record created by an approved payment
//! - `payment_record` - Per-payment audit record with merge semantics
//! - `payment_status` - Provider payment statuses
//! - `notification` - Webhook notification payloads
//! - `webhook_verifier` - HMAC-SHA256 signature verification
//! - `webhook_errors` - Error taxonomy for webhook handling

mod confirmed_user;
mod email;
mod intent;
mod notification;
mod payment_record;
mod payment_status;
mod webhook_errors;
mod webhook_verifier;

pub use confirmed_user::{ConfirmedUser, DEFAULT_USER_ROLE};
pub use email::Email;
pub use intent::{IntentStatus, PendingIntent};
pub use notification::{
    Notification, NotificationData, PaymentNotification, ResourceId, WebhookNotification,
    PAYMENT_KIND,
};
pub use payment_record::PaymentRecord;
pub use payment_status::PaymentStatus;
pub use webhook_errors::{WebhookError, WebhookErrorKind};
pub use webhook_verifier::{sign_payload, verify, SignatureHeader, WebhookSignatureVerifier};

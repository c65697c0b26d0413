//! Payment handlers.
//!
//! ## Commands
//! - Registering a pending intent before checkout
//! - Processing verified Mercado Pago notifications

mod process_notification;
mod register_intent;

pub use process_notification::{
    NotificationOutcome, ProcessNotificationCommand, ProcessNotificationConfig,
    ProcessNotificationHandler,
};
pub use register_intent::{RegisterIntentCommand, RegisterIntentHandler, RegisterIntentResult};

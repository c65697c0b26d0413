//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod payment;

pub use payment::{
    NotificationOutcome, ProcessNotificationCommand, ProcessNotificationConfig,
    ProcessNotificationHandler, RegisterIntentCommand, RegisterIntentHandler,
    RegisterIntentResult,
};

//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `payment` - Payment intents, confirmed users and webhook verification

pub mod foundation;
pub mod payment;

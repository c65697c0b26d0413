//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{handle_mercadopago_webhook, health, register_intent, PaymentAppState};

/// Create the webhook router.
///
/// Webhooks carry no user authentication; they are verified via signature.
///
/// # Routes
/// - `POST /webhook-mercadopago` - Handle Mercado Pago notifications
pub fn webhook_routes() -> Router<PaymentAppState> {
    Router::new().route("/webhook-mercadopago", post(handle_mercadopago_webhook))
}

/// Create the intent registration router.
///
/// # Routes
/// - `POST /guardar-email` - Register a pending intent
pub fn intent_routes() -> Router<PaymentAppState> {
    Router::new().route("/guardar-email", post(register_intent))
}

/// Create the complete payment module router, including `GET /health`.
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new()
        .route("/health", get(health))
        .merge(webhook_routes())
        .merge(intent_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::memory::InMemoryPaymentStore;
    use crate::application::handlers::payment::{
        ProcessNotificationConfig, ProcessNotificationHandler, RegisterIntentHandler,
    };

    fn test_state() -> PaymentAppState {
        let store = InMemoryPaymentStore::new();
        PaymentAppState {
            process_notification: Arc::new(ProcessNotificationHandler::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                None,
                ProcessNotificationConfig::default(),
            )),
            register_intent: Arc::new(RegisterIntentHandler::new(Arc::new(store))),
            verifier: None,
        }
    }

    #[test]
    fn webhook_routes_creates_router() {
        let _: Router<()> = webhook_routes().with_state(test_state());
    }

    #[test]
    fn payment_router_creates_combined_router() {
        let _: Router<()> = payment_router().with_state(test_state());
    }
}

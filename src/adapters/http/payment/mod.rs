//! HTTP adapter for payment endpoints.
//!
//! Exposes the payment flow via REST API:
//! - `POST /webhook-mercadopago` - Handle signed Mercado Pago notifications
//! - `POST /guardar-email` - Register a pending intent before checkout
//! - `GET /health` - Liveness check

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{PaymentAppState, WebhookApiError, SIGNATURE_HEADER};
pub use routes::payment_router;

//! HTTP adapters - REST API implementations.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Request ID (set `x-request-id` when absent, echo it on the response)
//! 2. `TraceLayer` (one span per request)
//! 3. `TimeoutLayer` (bounded request time)

pub mod payment;

use std::time::Duration;

use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

// Re-export key types for convenience
pub use payment::{payment_router, PaymentAppState, WebhookApiError};

/// Builds the service router with its middleware stack.
pub fn app_router(state: PaymentAppState, request_timeout: Duration) -> Router {
    payment_router()
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

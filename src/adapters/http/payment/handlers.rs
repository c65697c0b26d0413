//! HTTP handlers for payment endpoints.
//!
//! These handlers connect Axum routes to application layer command handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::payment::{
    ProcessNotificationCommand, ProcessNotificationHandler, RegisterIntentCommand,
    RegisterIntentHandler,
};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::{
    WebhookError, WebhookErrorKind, WebhookNotification, WebhookSignatureVerifier,
};

use super::dto::{
    ErrorResponse, HealthResponse, RegisterIntentRequest, RegisterIntentResponse,
    WebhookResponse,
};

/// Header carrying the provider's HMAC signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// `verifier` is `None` when no webhook secret is configured; every webhook
/// is then answered with a server error instead of being processed unsigned.
#[derive(Clone)]
pub struct PaymentAppState {
    pub process_notification: Arc<ProcessNotificationHandler>,
    pub register_intent: Arc<RegisterIntentHandler>,
    pub verifier: Option<Arc<WebhookSignatureVerifier>>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook-mercadopago - Handle a signed Mercado Pago notification
///
/// Takes the body as raw bytes: the signature covers the exact bytes sent.
pub async fn handle_mercadopago_webhook(
    State(state): State<PaymentAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(WebhookError::MissingSignature)?;

    let verifier = state.verifier.as_ref().ok_or_else(|| {
        tracing::error!("Webhook received but no webhook secret is configured");
        WebhookError::MissingSecret
    })?;

    let signature = signature
        .to_str()
        .map_err(|_| WebhookError::MalformedSignature("header is not visible ASCII".to_string()))?;

    verifier.check(&body, signature)?;

    let notification = WebhookNotification::parse(&body)?.into_notification()?;

    let cmd = ProcessNotificationCommand {
        notification,
        raw_body: String::from_utf8(body.to_vec()).ok(),
    };

    let outcome = state.process_notification.handle(cmd).await?;

    tracing::info!(
        outcome = outcome.label(),
        payment_id = outcome.payment_id().map(|id| id.as_str()).unwrap_or(""),
        "Webhook processed"
    );

    Ok(Json(WebhookResponse::from(&outcome)))
}

/// POST /guardar-email - Register a pending intent
pub async fn register_intent(
    State(state): State<PaymentAppState>,
    payload: Result<Json<RegisterIntentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, WebhookApiError> {
    let Json(request) =
        payload.map_err(|rejection| WebhookError::InvalidPayload(rejection.body_text()))?;

    let email = request
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or(WebhookError::MissingField("email"))?;

    let result = state
        .register_intent
        .handle(RegisterIntentCommand { email })
        .await
        .map_err(registration_error)?;

    Ok(Json(RegisterIntentResponse::from(&result.intent)))
}

fn registration_error(err: DomainError) -> WebhookError {
    match err.code {
        ErrorCode::ValidationFailed => WebhookError::InvalidPayload(err.message),
        _ => WebhookError::from(err),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness check. Does not touch the store.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(WebhookError);

impl WebhookApiError {
    pub fn inner(&self) -> &WebhookError {
        &self.0
    }
}

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();

        match self.0.kind() {
            WebhookErrorKind::Auth => {
                tracing::warn!(code = self.0.code(), "Webhook rejected: {}", self.0);
            }
            WebhookErrorKind::Validation => {
                tracing::warn!(code = self.0.code(), "Bad request: {}", self.0);
            }
            WebhookErrorKind::Upstream => {
                tracing::warn!(code = self.0.code(), "Acknowledging after upstream failure: {}", self.0);
                let body = WebhookResponse::acknowledged(self.0.to_string());
                return (status, Json(body)).into_response();
            }
            WebhookErrorKind::Config | WebhookErrorKind::Store => {
                tracing::error!(
                    code = self.0.code(),
                    retryable = self.0.is_retryable(),
                    "Webhook processing failed: {}",
                    self.0
                );
            }
        }

        // Server-side details stay in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorResponse::new(self.0.code(), message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentStore;
    use crate::application::handlers::payment::ProcessNotificationConfig;
    use crate::domain::payment::sign_payload;
    use axum::http::HeaderValue;
    use secrecy::SecretString;

    const SECRET: &str = "test-webhook-secret";

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn test_state(store: &InMemoryPaymentStore, with_secret: bool) -> PaymentAppState {
        let verifier = with_secret.then(|| {
            Arc::new(WebhookSignatureVerifier::new(SecretString::new(SECRET.to_string())).unwrap())
        });

        PaymentAppState {
            process_notification: Arc::new(ProcessNotificationHandler::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                None,
                ProcessNotificationConfig::default(),
            )),
            register_intent: Arc::new(RegisterIntentHandler::new(Arc::new(store.clone()))),
            verifier,
        }
    }

    fn signed_headers(body: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            SIGNATURE_HEADER,
            HeaderValue::from_str(&sign_payload(SECRET, body)).unwrap(),
        );
        headers
    }

    fn status_of(result: Result<impl IntoResponse, WebhookApiError>) -> StatusCode {
        match result {
            Ok(response) => response.into_response().status(),
            Err(err) => err.into_response().status(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Handler Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn missing_signature_is_forbidden_even_without_secret() {
        let store = InMemoryPaymentStore::new();
        let body = Bytes::from_static(br#"{"type":"payment","data":{"id":"1"}}"#);

        let result =
            handle_mercadopago_webhook(State(test_state(&store, false)), HeaderMap::new(), body)
                .await;

        assert_eq!(status_of(result), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_secret_is_server_error() {
        let store = InMemoryPaymentStore::new();
        let body = Bytes::from_static(br#"{"type":"payment","data":{"id":"1"}}"#);
        let headers = signed_headers(&body);

        let result =
            handle_mercadopago_webhook(State(test_state(&store, false)), headers, body).await;

        assert_eq!(status_of(result), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn signed_merchant_order_is_acknowledged() {
        let store = InMemoryPaymentStore::new();
        let body = Bytes::from_static(br#"{"type":"merchant_order","data":{"id":"9"}}"#);
        let headers = signed_headers(&body);

        let result =
            handle_mercadopago_webhook(State(test_state(&store, true)), headers, body).await;

        assert_eq!(status_of(result), StatusCode::OK);
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn signed_payment_without_id_is_bad_request() {
        let store = InMemoryPaymentStore::new();
        let body = Bytes::from_static(br#"{"type":"payment","data":{}}"#);
        let headers = signed_headers(&body);

        let result =
            handle_mercadopago_webhook(State(test_state(&store, true)), headers, body).await;

        assert_eq!(status_of(result), StatusCode::BAD_REQUEST);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Register Intent Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn register_intent_without_email_is_bad_request() {
        let store = InMemoryPaymentStore::new();
        let request = RegisterIntentRequest { email: None };

        let result = register_intent(State(test_state(&store, true)), Ok(Json(request))).await;

        assert_eq!(status_of(result), StatusCode::BAD_REQUEST);
        assert!(store.intents().await.is_empty());
    }

    #[tokio::test]
    async fn register_intent_with_invalid_email_is_bad_request() {
        let store = InMemoryPaymentStore::new();
        let request = RegisterIntentRequest {
            email: Some("nobody".to_string()),
        };

        let result = register_intent(State(test_state(&store, true)), Ok(Json(request))).await;

        assert_eq!(status_of(result), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_intent_stores_intent() {
        let store = InMemoryPaymentStore::new();
        let request = RegisterIntentRequest {
            email: Some("ana@example.com".to_string()),
        };

        let result = register_intent(State(test_state(&store, true)), Ok(Json(request))).await;

        assert_eq!(status_of(result), StatusCode::OK);
        assert_eq!(store.intents().await.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_on_register_is_server_error() {
        let store = InMemoryPaymentStore::new();
        store.set_failing(true);
        let request = RegisterIntentRequest {
            email: Some("ana@example.com".to_string()),
        };

        let result = register_intent(State(test_state(&store, true)), Ok(Json(request))).await;

        assert_eq!(status_of(result), StatusCode::INTERNAL_SERVER_ERROR);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Mapping Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn upstream_error_is_acknowledged_with_ok() {
        let response = WebhookApiError::from(WebhookError::Upstream("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn validation_domain_error_maps_to_invalid_payload() {
        let err = registration_error(DomainError::new(ErrorCode::ValidationFailed, "bad email"));
        assert!(matches!(err, WebhookError::InvalidPayload(_)));

        let err = registration_error(DomainError::database("down"));
        assert!(matches!(err, WebhookError::Store(_)));
    }
}

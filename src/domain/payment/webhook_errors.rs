//! Webhook error types for payment notification handling.
//!
//! One taxonomy for every failure a delivery can hit, with the HTTP status
//! the provider should see and whether a redelivery could succeed.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};

/// Coarse classification of webhook failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookErrorKind {
    /// Bad or missing signature.
    Auth,
    /// Server misconfiguration (missing secret or credentials).
    Config,
    /// Malformed body, header or missing required field.
    Validation,
    /// Provider status query failed.
    Upstream,
    /// Document store failure.
    Store,
}

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The `x-signature` header is absent.
    #[error("Missing signature header")]
    MissingSignature,

    /// The signature header could not be parsed.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// HMAC verification failed.
    #[error("Invalid signature")]
    SignatureMismatch,

    /// Signature timestamp outside the accepted window.
    #[error("Signature timestamp out of range")]
    SignatureExpired,

    /// No webhook secret configured on this server.
    #[error("Webhook secret not configured")]
    MissingSecret,

    /// Body is not a valid notification.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Required field missing from the notification.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Provider status query failed or timed out.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Store read or write failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    pub fn kind(&self) -> WebhookErrorKind {
        match self {
            WebhookError::MissingSignature
            | WebhookError::SignatureMismatch
            | WebhookError::SignatureExpired => WebhookErrorKind::Auth,
            WebhookError::MissingSecret => WebhookErrorKind::Config,
            WebhookError::MalformedSignature(_)
            | WebhookError::InvalidPayload(_)
            | WebhookError::MissingField(_) => WebhookErrorKind::Validation,
            WebhookError::Upstream(_) => WebhookErrorKind::Upstream,
            WebhookError::Store(_) => WebhookErrorKind::Store,
        }
    }

    /// Returns true if a redelivery of the same webhook could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            WebhookErrorKind::Upstream | WebhookErrorKind::Store
        )
    }

    /// Maps the error to the HTTP status returned to the provider.
    ///
    /// Upstream failures are acknowledged with 200: the payment is recorded
    /// for reconciliation and a retry storm would not help.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            WebhookErrorKind::Auth => StatusCode::FORBIDDEN,
            WebhookErrorKind::Validation => StatusCode::BAD_REQUEST,
            WebhookErrorKind::Upstream => StatusCode::OK,
            WebhookErrorKind::Config | WebhookErrorKind::Store => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for response bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "MISSING_SIGNATURE",
            WebhookError::MalformedSignature(_) => "MALFORMED_SIGNATURE",
            WebhookError::SignatureMismatch => "INVALID_SIGNATURE",
            WebhookError::SignatureExpired => "SIGNATURE_EXPIRED",
            WebhookError::MissingSecret => "SERVER_MISCONFIGURED",
            WebhookError::InvalidPayload(_) => "INVALID_PAYLOAD",
            WebhookError::MissingField(_) => "MISSING_FIELD",
            WebhookError::Upstream(_) => "UPSTREAM_ERROR",
            WebhookError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Store(err.to_string())
    }
}

impl From<ValidationError> for WebhookError {
    fn from(err: ValidationError) -> Self {
        WebhookError::InvalidPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_displays_field_name() {
        let err = WebhookError::MissingField("data.id");
        assert_eq!(format!("{}", err), "Missing field: data.id");
    }

    #[test]
    fn auth_failures_return_forbidden() {
        assert_eq!(WebhookError::MissingSignature.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(WebhookError::SignatureMismatch.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(WebhookError::SignatureExpired.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_secret_is_server_error_not_auth() {
        let err = WebhookError::MissingSecret;
        assert_eq!(err.kind(), WebhookErrorKind::Config);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn malformed_input_returns_bad_request() {
        assert_eq!(
            WebhookError::MalformedSignature("bad hex".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidPayload("not json".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingField("data.id").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_failure_is_acknowledged() {
        assert_eq!(
            WebhookError::Upstream("timeout".into()).status_code(),
            StatusCode::OK
        );
    }

    #[test]
    fn store_failure_is_retryable_server_error() {
        let err = WebhookError::Store("connection reset".into());
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_and_validation_are_not_retryable() {
        assert!(!WebhookError::SignatureMismatch.is_retryable());
        assert!(!WebhookError::MissingField("type").is_retryable());
        assert!(!WebhookError::MissingSecret.is_retryable());
    }

    #[test]
    fn domain_error_becomes_store_error() {
        let err: WebhookError = DomainError::database("boom").into();
        assert!(matches!(err, WebhookError::Store(_)));
    }
}

//! Mercado Pago payment status adapter.
//!
//! Implements `PaymentStatusProvider` against the Mercado Pago payments API:
//! `GET {api_base_url}/v1/payments/{id}` with a bearer access token.
//!
//! # Configuration
//!
//! ```ignore
//! let config = MercadoPagoApiConfig::new(access_token).with_timeout(Duration::from_secs(5));
//! let adapter = MercadoPagoStatusAdapter::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::PaymentId;
use crate::domain::payment::{PaymentStatus, ResourceId};
use crate::ports::{PaymentDetails, PaymentStatusProvider, ProviderError};

/// Default base URL of the Mercado Pago API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.mercadopago.com";

/// Default bound on a single status query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Mercado Pago API configuration.
#[derive(Clone)]
pub struct MercadoPagoApiConfig {
    /// Private access token (APP_USR-... or TEST-...).
    access_token: SecretString,

    /// Base URL for the API (default: https://api.mercadopago.com).
    api_base_url: String,

    /// Timeout applied to each status query.
    timeout: Duration,
}

impl MercadoPagoApiConfig {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            access_token,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Payment resource as returned by `/v1/payments/{id}`.
#[derive(Debug, Deserialize)]
struct MercadoPagoPayment {
    id: ResourceId,
    status: String,
    #[serde(default)]
    external_reference: Option<String>,
    #[serde(default)]
    live_mode: Option<bool>,
}

/// Mercado Pago status query adapter.
pub struct MercadoPagoStatusAdapter {
    config: MercadoPagoApiConfig,
    http_client: reqwest::Client,
}

impl MercadoPagoStatusAdapter {
    pub fn new(config: MercadoPagoApiConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Builds the payment resource URL with the id as one encoded segment.
    fn payment_url(&self, payment_id: &PaymentId) -> Result<reqwest::Url, ProviderError> {
        let mut url = reqwest::Url::parse(&self.config.api_base_url)
            .map_err(|e| ProviderError::Network(format!("invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Network("API base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("v1")
            .push("payments")
            .push(payment_id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl PaymentStatusProvider for MercadoPagoStatusAdapter {
    async fn payment_details(&self, payment_id: &PaymentId) -> Result<PaymentDetails, ProviderError> {
        let url = self.payment_url(payment_id)?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.config.access_token.expose_secret())
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(payment_id.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            tracing::error!(http_status = status.as_u16(), "Mercado Pago rejected access token");
            return Err(ProviderError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Decode(e.to_string())
            }
        })?;
        let payment: MercadoPagoPayment = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let id = PaymentId::new(payment.id.to_text())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if &id != payment_id {
            tracing::warn!(
                requested = %payment_id,
                returned = %id,
                "Mercado Pago returned a different payment id"
            );
            return Err(ProviderError::Decode(format!(
                "requested payment {} but received {}",
                payment_id, id
            )));
        }

        Ok(PaymentDetails {
            id,
            status: PaymentStatus::parse(&payment.status),
            external_reference: payment
                .external_reference
                .filter(|r| !r.trim().is_empty()),
            live_mode: payment.live_mode,
            raw,
        })
    }
}

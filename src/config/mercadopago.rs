//! Mercado Pago configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::payment::DEFAULT_USER_ROLE;

/// Mercado Pago configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MercadoPagoConfig {
    /// Shared secret for `x-signature` verification
    pub webhook_secret: Option<SecretString>,

    /// Private access token for payment status queries
    pub access_token: Option<SecretString>,

    /// Base URL of the payments API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bound on a single status query, in seconds
    #[serde(default = "default_status_query_timeout")]
    pub status_query_timeout_secs: u64,

    /// Replay window for timestamped signatures; disabled when unset
    pub max_signature_age_secs: Option<u64>,

    /// Ignore notifications flagged `live_mode: false`
    #[serde(default)]
    pub require_live_mode: bool,

    /// Role assigned to confirmed users
    #[serde(default = "default_user_role")]
    pub confirmed_user_role: String,
}

impl MercadoPagoConfig {
    /// Webhook secret, if one is set and non-blank.
    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().trim().is_empty())
    }

    /// Access token, if one is set and non-blank.
    pub fn access_token(&self) -> Option<&SecretString> {
        self.access_token
            .as_ref()
            .filter(|s| !s.expose_secret().trim().is_empty())
    }

    /// Check if using a Mercado Pago test credential
    pub fn is_test_mode(&self) -> bool {
        self.access_token()
            .map(|t| t.expose_secret().starts_with("TEST-"))
            .unwrap_or(false)
    }

    /// Get status query timeout as Duration
    pub fn status_query_timeout(&self) -> Duration {
        Duration::from_secs(self.status_query_timeout_secs)
    }

    /// Validate Mercado Pago configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.status_query_timeout_secs == 0 || self.status_query_timeout_secs > 60 {
            return Err(ValidationError::InvalidStatusQueryTimeout);
        }
        if self.max_signature_age_secs == Some(0) {
            return Err(ValidationError::InvalidSignatureMaxAge);
        }
        if self.confirmed_user_role.trim().is_empty() {
            return Err(ValidationError::EmptyUserRole);
        }
        Ok(())
    }
}

impl Default for MercadoPagoConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            access_token: None,
            api_base_url: default_api_base_url(),
            status_query_timeout_secs: default_status_query_timeout(),
            max_signature_age_secs: None,
            require_live_mode: false,
            confirmed_user_role: default_user_role(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.mercadopago.com".to_string()
}

fn default_status_query_timeout() -> u64 {
    10
}

fn default_user_role() -> String {
    DEFAULT_USER_ROLE.to_string()
}

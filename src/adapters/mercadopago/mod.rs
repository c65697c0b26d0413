//! Mercado Pago adapters.
//!
//! - `MercadoPagoStatusAdapter` - status queries against the live API
//! - `MockPaymentStatusProvider` - configurable test double

mod mercadopago_adapter;
mod mock_status_provider;

pub use mercadopago_adapter::{
    MercadoPagoApiConfig, MercadoPagoStatusAdapter, DEFAULT_API_BASE_URL, DEFAULT_QUERY_TIMEOUT,
};
pub use mock_status_provider::MockPaymentStatusProvider;

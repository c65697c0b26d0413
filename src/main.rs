//! Payment webhook receiver binary.

use std::sync::Arc;

use payment_webhook_receiver::adapters::http::{app_router, PaymentAppState};
use payment_webhook_receiver::adapters::memory::InMemoryPaymentStore;
use payment_webhook_receiver::adapters::mercadopago::{
    MercadoPagoApiConfig, MercadoPagoStatusAdapter,
};
use payment_webhook_receiver::adapters::postgres::{
    self, PostgresIntentRepository, PostgresPaymentRecordRepository,
};
use payment_webhook_receiver::application::handlers::payment::{
    ProcessNotificationConfig, ProcessNotificationHandler, RegisterIntentHandler,
};
use payment_webhook_receiver::config::AppConfig;
use payment_webhook_receiver::domain::payment::WebhookSignatureVerifier;
use payment_webhook_receiver::init_tracing;
use payment_webhook_receiver::ports::{
    PaymentRecordRepository, PaymentStatusProvider, PendingIntentRepository,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    tracing::info!(
        environment = ?config.server.environment,
        "Starting payment webhook receiver"
    );

    let (intents, records) = build_store(&config).await?;
    let state = build_state(&config, intents, records)?;

    let addr = config.server.socket_addr()?;
    let app = app_router(state, config.server.request_timeout());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// PostgreSQL when a database URL is configured, otherwise the in-memory store.
async fn build_store(
    config: &AppConfig,
) -> Result<(Arc<dyn PendingIntentRepository>, Arc<dyn PaymentRecordRepository>), BoxError> {
    match config.database.url() {
        Some(url) => {
            let pool = postgres::connect(&config.database, url).await?;
            if config.database.run_migrations {
                postgres::run_migrations(&pool).await?;
                tracing::info!("Database migrations applied");
            }
            let intents: Arc<dyn PendingIntentRepository> =
                Arc::new(PostgresIntentRepository::new(pool.clone()));
            let records: Arc<dyn PaymentRecordRepository> =
                Arc::new(PostgresPaymentRecordRepository::new(pool));
            Ok((intents, records))
        }
        None => {
            tracing::warn!("No database configured, using in-memory store; state is lost on restart");
            let store = InMemoryPaymentStore::new();
            let intents: Arc<dyn PendingIntentRepository> = Arc::new(store.clone());
            let records: Arc<dyn PaymentRecordRepository> = Arc::new(store);
            Ok((intents, records))
        }
    }
}

fn build_state(
    config: &AppConfig,
    intents: Arc<dyn PendingIntentRepository>,
    records: Arc<dyn PaymentRecordRepository>,
) -> Result<PaymentAppState, BoxError> {
    let mp = &config.mercadopago;

    let status_provider: Option<Arc<dyn PaymentStatusProvider>> = match mp.access_token() {
        Some(token) => {
            if mp.is_test_mode() {
                tracing::info!("Using Mercado Pago test credentials");
            }
            let api = MercadoPagoApiConfig::new(token.clone())
                .with_base_url(mp.api_base_url.clone())
                .with_timeout(mp.status_query_timeout());
            Some(Arc::new(MercadoPagoStatusAdapter::new(api)) as Arc<dyn PaymentStatusProvider>)
        }
        None => {
            tracing::warn!("No Mercado Pago access token; notification bodies will be trusted for status");
            None
        }
    };

    let verifier = match mp.webhook_secret() {
        Some(secret) => Some(Arc::new(
            WebhookSignatureVerifier::new(secret.clone())?
                .with_max_age_secs(mp.max_signature_age_secs)
                .with_digest_logging(!config.is_production()),
        )),
        None => {
            tracing::warn!("No webhook secret configured; every webhook will be answered with 500");
            None
        }
    };

    let handler_config = ProcessNotificationConfig {
        require_live_mode: mp.require_live_mode,
        confirmed_user_role: mp.confirmed_user_role.clone(),
    };

    Ok(PaymentAppState {
        process_notification: Arc::new(ProcessNotificationHandler::new(
            intents.clone(),
            records,
            status_provider,
            handler_config,
        )),
        register_intent: Arc::new(RegisterIntentHandler::new(intents)),
        verifier,
    })
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

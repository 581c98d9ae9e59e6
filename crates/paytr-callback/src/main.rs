use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paytr::CallbackVerifier;
use paytr_callback::config::{CallbackConfig, LedgerBackend};
use paytr_callback::handler::LoggingHandler;
use paytr_callback::ledger::{
    start_purge_task, InMemoryLedger, NotificationLedger, SqliteLedger,
};
use paytr_callback::routes;
use paytr_callback::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CallbackConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let claim_ttl = Duration::from_secs(config.claim_ttl_secs);
    let ledger: Arc<dyn NotificationLedger> = match &config.ledger {
        LedgerBackend::Memory => {
            tracing::warn!(
                "Notification ledger: in-memory; redeliveries after a restart will be processed again"
            );
            Arc::new(InMemoryLedger::new().with_claim_ttl(claim_ttl))
        }
        LedgerBackend::Sqlite(path) => match SqliteLedger::open(path) {
            Ok(ledger) => {
                tracing::info!("Notification ledger: SQLite at {path}");
                Arc::new(ledger.with_claim_ttl(claim_ttl))
            }
            Err(e) => {
                tracing::error!("Failed to open notification ledger at {path}: {e}");
                tracing::error!("Refusing to start without a persistent ledger");
                std::process::exit(1);
            }
        },
    };

    start_purge_task(Arc::clone(&ledger), config.ledger_retention_secs);

    if config.metrics_token.is_none() && config.public_metrics {
        tracing::warn!("PAYTR_PUBLIC_METRICS is set; /metrics is served without authentication");
    }

    let state = web::Data::new(AppState {
        verifier: CallbackVerifier::new(config.merchant.credentials.clone()),
        ledger,
        handler: Arc::new(LoggingHandler),
        metrics_token: config.metrics_token.clone(),
        public_metrics: config.public_metrics,
    });

    let port = config.port;
    tracing::info!(
        merchant_id = %config.merchant.credentials.merchant_id(),
        "PayTR callback server listening on http://0.0.0.0:{port}/paytr/callback"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::configure)
            .service(routes::health)
            .service(routes::metrics_endpoint)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

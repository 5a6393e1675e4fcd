mod api;
mod application;
mod domain;
mod infrastructure;
mod ports;

use api::AppState;
use application::{ApplyJob, OrderTransitionEngine, PaymentService, ReconciliationJob, WebhookService};
use infrastructure::{
    AppConfig, ApplyWorker, MySqlLedgerRepository, MySqlOrderStore, PayByBankAdapter,
    ReconciliationScheduler, apply_channel,
};
use sqlx::MySqlPool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting PayByBank reconciliation service...");

    let config = AppConfig::from_env()?;
    info!(
        "PayByBank configured in {} mode against {}",
        if config.paybybank.test_mode { "test" } else { "live" },
        config.paybybank.base_url
    );

    // Database pool
    info!("Connecting to database...");
    let pool = MySqlPool::connect(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    info!("Database connected and migrated");
    let pool = Arc::new(pool);

    // Adapters
    let provider = Arc::new(PayByBankAdapter::new(Arc::new(config.paybybank.clone())));
    let ledger = Arc::new(MySqlLedgerRepository::new(pool.clone()));
    let orders = Arc::new(MySqlOrderStore::new(pool));

    // Services and jobs
    let engine = Arc::new(OrderTransitionEngine::new(
        orders.clone(),
        config.order_statuses.clone(),
    ));
    let payment_service = Arc::new(PaymentService::new(
        provider.clone(),
        ledger.clone(),
        orders.clone(),
        engine.clone(),
        config.paybybank.payment_code_life_hours,
    ));
    let webhook_service = Arc::new(WebhookService::new(
        ledger.clone(),
        orders.clone(),
        engine.clone(),
    ));

    let (dispatcher, apply_requests) = apply_channel();
    let apply_job = Arc::new(ApplyJob::new(ledger.clone(), orders, engine));
    let reconciliation_job = Arc::new(ReconciliationJob::new(
        provider,
        ledger,
        Arc::new(dispatcher),
        config.paybybank.batch_size,
    ));

    // Background workers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let apply_worker = tokio::spawn(
        ApplyWorker::new(apply_job, apply_requests).run(shutdown_rx.clone()),
    );
    let scheduler = tokio::spawn(
        ReconciliationScheduler::new(reconciliation_job, &config.schedule).run(shutdown_rx),
    );

    let app = api::create_router(AppState {
        payment_service,
        webhook_service,
    });

    let addr = config.server.addr();
    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  POST /api/payments - Create payment reference");
    info!("  GET  /api/payments/:order_id - Payment status");
    info!("  POST /api/payments/:order_id/refresh - Manual status update");
    info!("  POST /api/webhooks/paybybank - PayByBank webhook");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown_tx.send(true).ok();
        })
        .await?;

    apply_worker.await?;
    scheduler.await?;
    info!("Service stopped");

    Ok(())
}

//! Ledgerbank API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ledgerbank_account::application::command_handlers::AccountCommandHandler;
use ledgerbank_account::application::consumer::AccountEventConsumer;
use ledgerbank_account::application::projections::{
    AccountProjection, InMemoryAccountViewRepository,
};
use ledgerbank_account::application::query_handlers::AccountQueryHandler;
use ledgerbank_account::domain::events::ACCOUNT_TOPICS;
use ledgerbank_bus::RedisBus;
use ledgerbank_core::clock::{Clock, SystemClock};
use ledgerbank_core::dispatcher::CommandDispatcher;
use ledgerbank_event_store::{EventSourcingHandler, EventStore, PgEventRepository};

use ledgerbank_api::config::Config;
use ledgerbank_api::error::AppError;
use ledgerbank_api::routes;
use ledgerbank_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Ledgerbank API server");

    let config = Config::from_env()?;

    // Command side: durable store publishing to the bus.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.store_connection)
        .await?;
    let repository = Arc::new(PgEventRepository::new(pool));
    let bus = Arc::new(
        RedisBus::connect(&config.bus_bootstrap).map_err(|err| AppError::Bus(err.to_string()))?,
    );
    let store = Arc::new(
        EventStore::new(repository, bus.clone()).with_publish_retry_max(config.publish_retry_max),
    );
    let accounts = Arc::new(EventSourcingHandler::new(store.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let handler = Arc::new(AccountCommandHandler::new(accounts, clock));
    let mut dispatcher = CommandDispatcher::new();
    AccountCommandHandler::register(&handler, &mut dispatcher);
    let dispatcher = Arc::new(dispatcher);

    // Query side: consumer feeding the account read model.
    let views = Arc::new(InMemoryAccountViewRepository::new());
    let queries = Arc::new(AccountQueryHandler::new(views.clone()));

    let topics: Vec<String> = ACCOUNT_TOPICS.iter().map(|&topic| topic.to_owned()).collect();
    let subscription = bus
        .subscribe(&config.bus_consumer_group, "ledgerbank-api", topics)
        .await
        .map_err(|err| AppError::Bus(err.to_string()))?;
    let consumer = AccountEventConsumer::new(AccountProjection::new(views));
    tokio::spawn(async move {
        if let Err(err) = consumer.run(subscription).await {
            tracing::error!(error = %err, "event consumer stopped");
        }
    });

    // Re-drive publications parked during bus outages.
    let republisher = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            if republisher.pending_publications().await > 0 {
                if let Err(err) = republisher.republish_pending().await {
                    tracing::warn!(error = %err, "republication attempt failed");
                }
            }
        }
    });

    // Build router.
    let app_state = AppState::new(dispatcher, queries);
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/accounts", routes::accounts::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| AppError::Config(format!("invalid HOST:PORT combination: {err}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ledgerbank_account::application::command_handlers::AccountCommandHandler;
use ledgerbank_account::application::projections::{
    AccountProjection, InMemoryAccountViewRepository,
};
use ledgerbank_account::application::query_handlers::AccountQueryHandler;
use ledgerbank_account::domain::events::ACCOUNT_TOPICS;
use ledgerbank_bus::InMemoryEventBus;
use ledgerbank_core::bus::EventSubscription;
use ledgerbank_core::clock::Clock;
use ledgerbank_core::dispatcher::CommandDispatcher;
use ledgerbank_event_store::{EventSourcingHandler, EventStore, InMemoryEventRepository};
use ledgerbank_test_support::FixedClock;

use ledgerbank_api::routes;
use ledgerbank_api::state::AppState;

/// The full application wired over in-memory adapters, with handles for
/// driving the query side deterministically.
pub struct TestApp {
    pub router: Router,
    bus: Arc<InMemoryEventBus>,
    views: Arc<InMemoryAccountViewRepository>,
}

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

impl TestApp {
    /// Builds the app with the same route structure as `main.rs`.
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryEventRepository::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(EventStore::new(repository, bus.clone()));
        let accounts = Arc::new(EventSourcingHandler::new(store));

        let handler = Arc::new(AccountCommandHandler::new(accounts, fixed_clock()));
        let mut dispatcher = CommandDispatcher::new();
        AccountCommandHandler::register(&handler, &mut dispatcher);

        let views = Arc::new(InMemoryAccountViewRepository::new());
        let queries = Arc::new(AccountQueryHandler::new(views.clone()));

        let app_state = AppState::new(Arc::new(dispatcher), queries);
        let router = Router::new()
            .merge(routes::health::router())
            .nest("/api/v1/accounts", routes::accounts::router())
            .with_state(app_state);

        Self { router, bus, views }
    }

    /// Drains `expected` published events into the read model, the way the
    /// background consumer would.
    pub async fn project_backlog(&self, expected: usize) {
        let projection = AccountProjection::new(self.views.clone());
        let mut subscription = self.bus.subscribe(&ACCOUNT_TOPICS);
        for _ in 0..expected {
            let delivery = subscription
                .next()
                .await
                .unwrap()
                .expect("fewer published events than expected");
            projection.on_event(&delivery.event).await.unwrap();
            subscription.ack(&delivery).await.unwrap();
        }
    }
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use coursedesk_api::{
    app_router,
    auth::{self, AuthenticatedBuyer},
    cart::CartItem,
    config::AppConfig,
    db,
    entities::order_item::Plan,
    events,
    gateway::{GatewayPaymentStatus, StubPaymentGateway},
    services::orders::{BillingAddress, BillingDetails, CreateOrderInput},
    AppServices, AppState,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "integration_test_secret_integration_test_secret";

/// Application harness backed by an in-memory SQLite database and the stub
/// payment gateway. The stub defaults to failed verdicts so no test can pass
/// by accident; success must be scripted explicitly.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<StubPaymentGateway>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:",
            TEST_JWT_SECRET,
            "127.0.0.1",
            0,
            "test",
        );
        // A single pooled connection keeps the in-memory database alive and
        // shared for the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = events::EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = Arc::new(StubPaymentGateway::new(GatewayPaymentStatus::Failed));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            gateway.clone(),
            &cfg,
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            gateway: gateway.clone(),
            services,
        };

        let router = app_router(state.clone());

        Self {
            router,
            state,
            gateway,
            _event_task: event_task,
        }
    }

    #[allow(dead_code)]
    pub fn token_for(&self, buyer_id: &str, email: &str) -> String {
        auth::mint_token(TEST_JWT_SECRET, buyer_id, email, Some("Test Buyer"), 3600)
            .expect("failed to mint test token")
    }

    /// Fires one request at the router and decodes the JSON body.
    #[allow(dead_code)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(value) => builder
                .header("content-type", "application/json")
                .body(Body::from(value.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

#[allow(dead_code)]
pub fn test_buyer(id: &str) -> AuthenticatedBuyer {
    AuthenticatedBuyer {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: Some("Test Buyer".to_string()),
    }
}

#[allow(dead_code)]
pub fn billing_details() -> BillingDetails {
    BillingDetails {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "9999999999".to_string(),
        address: BillingAddress {
            line1: "12 Analytical Lane".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            country: "IN".to_string(),
        },
    }
}

#[allow(dead_code)]
pub fn cart_item(course_id: &str, plan: Plan, price: &str) -> CartItem {
    CartItem {
        course_id: course_id.to_string(),
        plan,
        course_name: format!("{} course", course_id),
        price: price.to_string(),
    }
}

#[allow(dead_code)]
pub fn order_input(items: Vec<CartItem>) -> CreateOrderInput {
    CreateOrderInput {
        billing: billing_details(),
        items,
    }
}

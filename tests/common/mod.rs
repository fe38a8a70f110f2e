#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use smallbiz_api::{config::AppConfig, db, events, AppState};
use tower::ServiceExt;
use uuid::Uuid;

pub const OWNER_ID: &str = "user_owner_1";
const TEST_SECRET: &str = "integration_test_signing_secret_with_entropy_7c1d";

/// Helper harness for spinning up the full router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            "test".to_string(),
        );
        // every connection to sqlite::memory: is its own database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let token = state
            .auth
            .issue_token(OWNER_ID, Some("owner@example.com"), Some("Test Owner"))
            .expect("issue test token");
        let router = smallbiz_api::build_router(state.clone());

        Self {
            router,
            state,
            token,
            _event_task: event_task,
        }
    }

    /// Bearer token for the default business owner.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Bearer token for some other user.
    pub fn token_for(&self, user_id: &str) -> String {
        self.state
            .auth
            .issue_token(user_id, None, None)
            .expect("issue token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Authenticated request as the default owner, returning status and JSON body.
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, Some(self.token())).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    /// POST that must succeed with 201, returning the created body.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, json) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, json);
        json
    }

    pub async fn create_business(&self, name: &str) -> Uuid {
        let business = self
            .create(
                "/api/v1/businesses",
                json!({
                    "name": name,
                    "opening_time": "09:00:00",
                    "closing_time": "17:00:00",
                }),
            )
            .await;
        id_of(&business)
    }

    pub async fn create_product(
        &self,
        business_id: Uuid,
        name: &str,
        price: &str,
        cost_price: &str,
        stock: &str,
    ) -> Uuid {
        let product = self
            .create(
                &format!("/api/v1/businesses/{}/products", business_id),
                json!({
                    "name": name,
                    "price": price,
                    "cost_price": cost_price,
                    "stock_quantity": stock,
                    "reorder_level": "2",
                }),
            )
            .await;
        id_of(&product)
    }

    pub async fn create_customer(&self, business_id: Uuid, name: &str) -> Uuid {
        let customer = self
            .create(
                &format!("/api/v1/businesses/{}/customers", business_id),
                json!({ "name": name }),
            )
            .await;
        id_of(&customer)
    }

    pub async fn product_stock(&self, business_id: Uuid, product_id: Uuid) -> Decimal {
        let (status, product) = self
            .get(&format!(
                "/api/v1/businesses/{}/products/{}",
                business_id, product_id
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        dec(&product["stock_quantity"])
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads the whole body as JSON; empty bodies become `null`.
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is json")
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(|| panic!("no id in {}", value))
}

/// Decimals serialize as strings; accept numbers too.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap_or_else(|_| panic!("bad decimal {}", s)),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("numeric decimal"),
        other => panic!("expected decimal, got {}", other),
    }
}

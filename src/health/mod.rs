//! Liveness and readiness probes.
//!
//! - `/health` reports the process is serving and its version
//! - `/health/ready` pings the database and answers 503 when it is unreachable
//! - `/health/live` reports uptime only

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Readiness body with one entry per dependency
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReadinessReport {
    pub status: HealthStatus,
    pub database: HealthStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub started: Instant,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            started: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub async fn check_database(&self) -> HealthStatus {
        match self.db_pool.ping().await {
            Ok(()) => HealthStatus::Up,
            Err(e) => {
                error!("Database health check failed: {}", e);
                HealthStatus::Down
            }
        }
    }
}

pub async fn health_check() -> impl IntoResponse {
    debug!("Health check endpoint called");
    Json(json!({
        "status": HealthStatus::Up,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let database = state.check_database().await;
    let report = ReadinessReport {
        status: database,
        database,
        timestamp: Utc::now(),
    };
    let code = match report.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(report))
}

pub async fn liveness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(json!({
        "alive": true,
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Router mounted at `/health`, outside authentication
pub fn health_routes(db_pool: Arc<DatabaseConnection>) -> Router {
    let state = Arc::new(HealthState::new(db_pool));
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sea_orm::Database;
    use tower::ServiceExt;

    #[tokio::test]
    async fn readiness_reports_database_up() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let app = health_routes(Arc::new(db));

        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let report: ReadinessReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(report.database, HealthStatus::Up);
    }
}

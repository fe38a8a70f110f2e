//! Prometheus metrics: HTTP request counters and latencies plus one counter
//! per domain event, exposed in text format at `/metrics`.

use crate::errors::ServiceError;
use axum::{
    extract::{MatchedPath, Request},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Instant;

lazy_static! {
    static ref HTTP_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "smallbiz_http_requests_total",
        "Total number of HTTP requests",
        &["method", "route", "status"]
    )
    .expect("metric can be created");
    static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "smallbiz_http_request_duration_seconds",
        "HTTP request latency in seconds",
        &["method", "route"]
    )
    .expect("metric can be created");
    static ref DOMAIN_EVENTS: IntCounterVec = register_int_counter_vec!(
        "smallbiz_domain_events_total",
        "Domain events processed by the event loop",
        &["event"]
    )
    .expect("metric can be created");
    static ref SERVICE_ERRORS: IntCounterVec = register_int_counter_vec!(
        "smallbiz_service_errors_total",
        "Service errors returned to clients",
        &["code"]
    )
    .expect("metric can be created");
}

pub fn record_domain_event(name: &str) {
    DOMAIN_EVENTS.with_label_values(&[name]).inc();
}

pub fn record_service_error(code: &str) {
    SERVICE_ERRORS.with_label_values(&[code]).inc();
}

/// Records count and latency per matched route template, so path ids
/// do not explode label cardinality.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS
        .with_label_values(&[method.as_str(), route.as_str(), status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str(), route.as_str()])
        .observe(elapsed);

    response
}

/// Renders the process registry in Prometheus text format
pub fn render() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding failed: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics were not utf-8: {}", e)))
}

pub async fn metrics_handler() -> Result<impl IntoResponse, ServiceError> {
    let body = render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_event_counter_shows_up_in_render() {
        record_domain_event("sale_recorded");
        record_domain_event("sale_recorded");

        let text = render().unwrap();
        assert!(text.contains("smallbiz_domain_events_total"));
        assert!(text.contains("event=\"sale_recorded\""));
    }

    #[test]
    fn service_error_counter_is_labelled_by_code() {
        record_service_error("insufficient_stock");
        let text = render().unwrap();
        assert!(text.contains("code=\"insufficient_stock\""));
    }
}

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use rust_decimal_macros::dec as d;
use serde_json::{json, Value};
use uuid::Uuid;

struct Fixture {
    business_id: Uuid,
    product_id: Uuid,
    client_id: Uuid,
    route_id: Uuid,
}

impl Fixture {
    fn uri(&self, tail: &str) -> String {
        format!(
            "/api/v1/businesses/{}/distribution/{}",
            self.business_id, tail
        )
    }
}

async fn fixture(app: &TestApp) -> Fixture {
    let business_id = app.create_business("Fresh Milk Co").await;
    let product_id = app
        .create_product(business_id, "Milk 1L", "1.20", "0.70", "100")
        .await;
    let client = app
        .create(
            &format!("/api/v1/businesses/{}/distribution/clients", business_id),
            json!({
                "name": "St. Mary's School",
                "client_type": "school",
                "contact_name": "Sister Agnes",
                "phone": "+255711000222",
                "address": "Plot 12, Mission Road",
            }),
        )
        .await;
    let route = app
        .create(
            &format!("/api/v1/businesses/{}/distribution/routes", business_id),
            json!({ "name": "North loop", "delivery_days": ["mon", "wed", "fri"] }),
        )
        .await;
    Fixture {
        business_id,
        product_id,
        client_id: id_of(&client),
        route_id: id_of(&route),
    }
}

#[tokio::test]
async fn routes_reject_unknown_days() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;

    let (status, _) = app
        .post(
            &f.uri("routes"),
            json!({ "name": "Weekend", "delivery_days": ["sat", "someday"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recurring_deliveries_skip_days_the_route_does_not_run() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;

    // 2025-03-03 is a Monday
    let (status, created) = app
        .post(
            &f.uri("deliveries/recurring"),
            json!({
                "client_id": f.client_id,
                "route_id": f.route_id,
                "product_id": f.product_id,
                "quantity": "30",
                "start_date": "2025-03-03",
                "end_date": "2025-03-09",
                "frequency": "daily",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let dates: Vec<_> = created
        .as_array()
        .expect("deliveries")
        .iter()
        .map(|d| d["scheduled_date"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(dates, vec!["2025-03-03", "2025-03-05", "2025-03-07"]);
    assert_eq!(dec(&created[0]["unit_price"]), d!(1.20));

    // a range holding only off days schedules nothing
    let (status, _) = app
        .post(
            &f.uri("deliveries/recurring"),
            json!({
                "client_id": f.client_id,
                "route_id": f.route_id,
                "quantity": "30",
                "start_date": "2025-03-08",
                "end_date": "2025-03-09",
                "frequency": "daily",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn schedule(app: &TestApp, f: &Fixture, date: &str, quantity: &str) -> Value {
    app.create(
        &f.uri("deliveries"),
        json!({
            "client_id": f.client_id,
            "route_id": f.route_id,
            "product_id": f.product_id,
            "scheduled_date": date,
            "quantity": quantity,
        }),
    )
    .await
}

async fn set_status(app: &TestApp, f: &Fixture, delivery_id: Uuid, status: &str) -> (StatusCode, Value) {
    app.call(
        Method::PATCH,
        &f.uri(&format!("deliveries/{}/status", delivery_id)),
        Some(json!({ "status": status })),
    )
    .await
}

#[tokio::test]
async fn delivering_takes_stock_and_ends_the_lifecycle() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    let delivery = schedule(&app, &f, "2025-03-05", "25").await;
    let delivery_id = id_of(&delivery);
    assert_eq!(delivery["status"], "scheduled");

    let (status, body) = set_status(&app, &f, delivery_id, "in_transit").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(app.product_stock(f.business_id, f.product_id).await, d!(100));

    let (status, body) = set_status(&app, &f, delivery_id, "delivered").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(!body["delivered_at"].is_null());
    assert_eq!(app.product_stock(f.business_id, f.product_id).await, d!(75));

    let (status, _) = set_status(&app, &f, delivery_id, "cancelled").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::DELETE,
            &f.uri(&format!("deliveries/{}", delivery_id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivering_more_than_stock_is_rejected() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    let delivery = schedule(&app, &f, "2025-03-05", "101").await;
    let (status, _) = set_status(&app, &f, id_of(&delivery), "in_transit").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = set_status(&app, &f, id_of(&delivery), "delivered").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, current) = app
        .get(&f.uri(&format!("deliveries/{}", id_of(&delivery))))
        .await;
    assert_eq!(current["status"], "in_transit");
}

#[tokio::test]
async fn deliveries_go_through_transit() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    let delivery = schedule(&app, &f, "2025-03-05", "10").await;

    let (status, _) = set_status(&app, &f, id_of(&delivery), "delivered").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.product_stock(f.business_id, f.product_id).await, d!(100));
}

#[tokio::test]
async fn manifest_lists_live_stops_for_the_day() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    schedule(&app, &f, "2025-03-05", "20").await;
    schedule(&app, &f, "2025-03-05", "10").await;
    let cancelled = schedule(&app, &f, "2025-03-05", "50").await;
    schedule(&app, &f, "2025-03-07", "99").await;

    let (status, _) = set_status(&app, &f, id_of(&cancelled), "cancelled").await;
    assert_eq!(status, StatusCode::OK);

    let (status, manifest) = app
        .get(&f.uri(&format!(
            "routes/{}/manifest?date=2025-03-05",
            f.route_id
        )))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", manifest);
    assert_eq!(manifest["runs_today"], true);
    assert_eq!(manifest["stops"].as_array().map(Vec::len), Some(2));
    assert_eq!(manifest["stops"][0]["client_name"], "St. Mary's School");
    assert_eq!(manifest["stops"][0]["contact_name"], "Sister Agnes");
    assert_eq!(dec(&manifest["total_quantity"]), d!(30));
    assert_eq!(dec(&manifest["total_value"]), d!(36.00));

    let (_, tuesday) = app
        .get(&f.uri(&format!(
            "routes/{}/manifest?date=2025-03-04",
            f.route_id
        )))
        .await;
    assert_eq!(tuesday["runs_today"], false);
    assert_eq!(tuesday["stops"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn clients_with_deliveries_cannot_be_deleted() {
    let app = TestApp::new().await;
    let f = fixture(&app).await;
    schedule(&app, &f, "2025-03-05", "5").await;

    let (status, _) = app
        .call(
            Method::DELETE,
            &f.uri(&format!("clients/{}", f.client_id)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

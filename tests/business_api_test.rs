mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;

#[tokio::test]
async fn create_list_and_update_business() {
    let app = TestApp::new().await;

    let business = app
        .create(
            "/api/v1/businesses",
            json!({ "name": "Mama's Bakery", "phone": "+255700000001" }),
        )
        .await;
    let id = id_of(&business);
    assert_eq!(business["owner_id"], OWNER_ID);
    assert_eq!(business["name"], "Mama's Bakery");

    let (status, listed) = app.get("/api/v1/businesses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["data"][0]["id"], id.to_string());

    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/api/v1/businesses/{}", id),
            Some(json!({ "name": "Mama's Bakery & Cafe" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["name"], "Mama's Bakery & Cafe");
}

#[tokio::test]
async fn rejects_closing_before_opening() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/api/v1/businesses",
            json!({
                "name": "Night Shift",
                "opening_time": "18:00:00",
                "closing_time": "08:00:00",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_users_cannot_reach_a_business() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Private Shop").await;

    let intruder = app.token_for("someone_else");
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/businesses/{}", business_id),
            None,
            Some(&intruder),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/businesses/{}/products", business_id),
            None,
            Some(&intruder),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (status, listed) = {
        let response = app
            .request(Method::GET, "/api/v1/businesses", None, Some(&intruder))
            .await;
        let status = response.status();
        (status, body_json(response).await)
    };
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["pagination"]["total"], 0);
}

#[tokio::test]
async fn missing_business_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .get(&format!("/api/v1/businesses/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/businesses", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/businesses", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_reports_the_token_subject() {
    let app = TestApp::new().await;
    let (status, me) = app.get("/api/v1/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user_id"], OWNER_ID);
    assert_eq!(me["email"], "owner@example.com");
}

#[tokio::test]
async fn liveness_probe_needs_no_token() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health/live", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_counts_records_and_low_stock() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Corner Store").await;
    app.create_product(business_id, "Rice 1kg", "3.50", "2.00", "40")
        .await;
    app.create_product(business_id, "Sugar 1kg", "2.00", "1.20", "1")
        .await;
    app.create_customer(business_id, "Asha").await;

    let (status, dashboard) = app
        .get(&format!("/api/v1/businesses/{}/dashboard", business_id))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", dashboard);
    assert_eq!(dashboard["products"], 2);
    assert_eq!(dashboard["low_stock_products"], 1);
    assert_eq!(dashboard["customers"], 1);
    assert_eq!(dashboard["suppliers"], 0);
}

#[tokio::test]
async fn deleting_a_business_removes_everything_it_owns() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Closing Down").await;
    let keep_id = app.create_business("Still Trading").await;

    let product_id = app
        .create_product(business_id, "Bread", "1.50", "0.80", "20")
        .await;
    let customer_id = app.create_customer(business_id, "Juma").await;
    app.create_product(keep_id, "Milk", "1.00", "0.60", "10")
        .await;

    app.create(
        &format!("/api/v1/businesses/{}/sales", business_id),
        json!({
            "customer_id": customer_id,
            "items": [{ "product_id": product_id, "quantity": "2" }],
            "amount_paid": "1.00",
        }),
    )
    .await;

    let (status, summary) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/businesses/{}", business_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", summary);

    let deleted = |table: &str| {
        summary["tables"]
            .as_array()
            .and_then(|tables| tables.iter().find(|t| t["table"] == table))
            .and_then(|t| t["deleted"].as_u64())
            .unwrap_or_else(|| panic!("no count for {} in {}", table, summary))
    };
    assert_eq!(deleted("businesses"), 1);
    assert_eq!(deleted("products"), 1);
    assert_eq!(deleted("customers"), 1);
    assert_eq!(deleted("sales"), 1);
    assert_eq!(deleted("sale_items"), 1);
    assert_eq!(deleted("debts"), 1);
    assert_eq!(deleted("appointments"), 0);
    assert_eq!(summary["total"], 6);

    let (status, _) = app
        .get(&format!("/api/v1/businesses/{}", business_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, products) = app
        .get(&format!("/api/v1/businesses/{}/products", keep_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products["pagination"]["total"], 1);
}

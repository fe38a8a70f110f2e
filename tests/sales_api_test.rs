mod common;

use axum::http::StatusCode;
use common::*;
use rust_decimal_macros::dec as d;
use serde_json::json;

#[tokio::test]
async fn sale_takes_items_out_of_stock() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Kiosk").await;
    let soda = app
        .create_product(business_id, "Soda", "1.00", "0.60", "24")
        .await;
    let chips = app
        .create_product(business_id, "Chips", "0.50", "0.20", "10")
        .await;

    let sale = app
        .create(
            &format!("/api/v1/businesses/{}/sales", business_id),
            json!({
                "items": [
                    { "product_id": soda, "quantity": "3" },
                    { "product_id": chips, "quantity": "4", "unit_price": "0.45" },
                ],
                "discount": "0.30",
                "payment_method": "mobile_money",
            }),
        )
        .await;

    assert_eq!(dec(&sale["subtotal"]), d!(4.80));
    assert_eq!(dec(&sale["total"]), d!(4.50));
    assert_eq!(dec(&sale["amount_paid"]), d!(4.50));
    assert_eq!(sale["payment_status"], "paid");
    assert_eq!(sale["items"].as_array().map(Vec::len), Some(2));
    assert!(sale["debt"].is_null());

    assert_eq!(app.product_stock(business_id, soda).await, d!(21));
    assert_eq!(app.product_stock(business_id, chips).await, d!(6));
}

#[tokio::test]
async fn partial_payment_opens_a_receivable() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Tailor").await;
    let shirt = app
        .create_product(business_id, "Shirt", "15.00", "8.00", "5")
        .await;
    let customer_id = app.create_customer(business_id, "Baraka").await;

    let sale = app
        .create(
            &format!("/api/v1/businesses/{}/sales", business_id),
            json!({
                "customer_id": customer_id,
                "items": [{ "product_id": shirt, "quantity": "2" }],
                "amount_paid": "10.00",
                "due_date": "2025-04-30",
            }),
        )
        .await;
    assert_eq!(sale["payment_status"], "partial");
    assert_eq!(sale["debt"]["direction"], "receivable");
    assert_eq!(dec(&sale["debt"]["amount"]), d!(20.00));
    assert_eq!(sale["debt"]["customer_id"], customer_id.to_string());

    let (status, debts) = app
        .get(&format!(
            "/api/v1/businesses/{}/debts?direction=receivable",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(debts["pagination"]["total"], 1);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_the_whole_sale() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Butcher").await;
    let beef = app
        .create_product(business_id, "Beef 1kg", "8.00", "5.00", "10")
        .await;
    let goat = app
        .create_product(business_id, "Goat 1kg", "9.00", "6.00", "1")
        .await;

    let (status, body) = app
        .post(
            &format!("/api/v1/businesses/{}/sales", business_id),
            json!({
                "items": [
                    { "product_id": beef, "quantity": "4" },
                    { "product_id": goat, "quantity": "2" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    assert_eq!(app.product_stock(business_id, beef).await, d!(10));
    assert_eq!(app.product_stock(business_id, goat).await, d!(1));

    let (_, sales) = app
        .get(&format!("/api/v1/businesses/{}/sales", business_id))
        .await;
    assert_eq!(sales["pagination"]["total"], 0);
}

#[tokio::test]
async fn overpayment_and_oversized_discount_are_rejected() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Salon").await;
    let oil = app
        .create_product(business_id, "Hair oil", "5.00", "2.00", "10")
        .await;
    let uri = format!("/api/v1/businesses/{}/sales", business_id);

    let (status, _) = app
        .post(
            &uri,
            json!({ "items": [{ "product_id": oil, "quantity": "1" }], "amount_paid": "6.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            &uri,
            json!({ "items": [{ "product_id": oil, "quantity": "1" }], "discount": "5.01" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&uri, json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn voiding_restocks_and_drops_the_receivable() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Electronics").await;
    let radio = app
        .create_product(business_id, "Radio", "30.00", "18.00", "3")
        .await;
    let customer_id = app.create_customer(business_id, "Zawadi").await;

    let sale = app
        .create(
            &format!("/api/v1/businesses/{}/sales", business_id),
            json!({
                "customer_id": customer_id,
                "items": [{ "product_id": radio, "quantity": "2" }],
                "amount_paid": "0",
                "payment_method": "credit",
            }),
        )
        .await;
    assert_eq!(sale["payment_status"], "unpaid");
    assert_eq!(app.product_stock(business_id, radio).await, d!(1));

    let void_uri = format!(
        "/api/v1/businesses/{}/sales/{}/void",
        business_id,
        id_of(&sale)
    );
    let (status, voided) = app.post(&void_uri, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", voided);
    assert_eq!(voided["status"], "voided");
    assert_eq!(app.product_stock(business_id, radio).await, d!(3));

    let (_, debts) = app
        .get(&format!("/api/v1/businesses/{}/debts", business_id))
        .await;
    assert_eq!(debts["pagination"]["total"], 0);

    let (status, _) = app.post(&void_uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sales_report_totals_completed_sales_in_range() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Bakery").await;
    let bread = app
        .create_product(business_id, "Bread", "2.00", "1.00", "100")
        .await;
    let cake = app
        .create_product(business_id, "Cake", "10.00", "4.00", "10")
        .await;
    let uri = format!("/api/v1/businesses/{}/sales", business_id);

    app.create(
        &uri,
        json!({
            "items": [{ "product_id": bread, "quantity": "5" }],
            "sold_at": "2025-03-10T08:30:00Z",
        }),
    )
    .await;
    app.create(
        &uri,
        json!({
            "items": [
                { "product_id": bread, "quantity": "2" },
                { "product_id": cake, "quantity": "1" },
            ],
            "discount": "1.00",
            "payment_method": "card",
            "sold_at": "2025-03-11T15:00:00Z",
        }),
    )
    .await;
    // outside the range
    app.create(
        &uri,
        json!({
            "items": [{ "product_id": cake, "quantity": "1" }],
            "sold_at": "2025-04-02T09:00:00Z",
        }),
    )
    .await;
    // voided sales are excluded
    let voided = app
        .create(
            &uri,
            json!({
                "items": [{ "product_id": cake, "quantity": "2" }],
                "sold_at": "2025-03-12T09:00:00Z",
            }),
        )
        .await;
    let (status, _) = app
        .post(&format!("{}/{}/void", uri, id_of(&voided)), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, report) = app
        .get(&format!(
            "/api/v1/businesses/{}/reports/sales?from=2025-03-01&to=2025-03-31",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", report);
    assert_eq!(report["transaction_count"], 2);
    assert_eq!(dec(&report["gross_revenue"]), d!(24.00));
    assert_eq!(dec(&report["discounts"]), d!(1.00));
    assert_eq!(dec(&report["net_revenue"]), d!(23.00));
    assert_eq!(dec(&report["cost_of_goods"]), d!(11.00));
    assert_eq!(dec(&report["gross_profit"]), d!(12.00));
    assert_eq!(dec(&report["items_sold"]), d!(8));
    assert_eq!(report["daily"].as_array().map(Vec::len), Some(31));
    assert_eq!(report["daily"][9]["date"], "2025-03-10");
    assert_eq!(dec(&report["daily"][9]["revenue"]), d!(10.00));
    assert_eq!(report["daily"][10]["transactions"], 1);
    assert_eq!(report["top_products"][0]["product_name"], "Bread");

    let (status, _) = app
        .get(&format!(
            "/api/v1/businesses/{}/reports/sales?from=2025-03-31&to=2025-03-01",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sale_with_paid_down_balance_cannot_be_voided() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Furniture").await;
    let chair = app
        .create_product(business_id, "Chair", "40.00", "25.00", "4")
        .await;
    let customer_id = app.create_customer(business_id, "Juma").await;

    let sale = app
        .create(
            &format!("/api/v1/businesses/{}/sales", business_id),
            json!({
                "customer_id": customer_id,
                "items": [{ "product_id": chair, "quantity": "2" }],
                "amount_paid": "30.00",
            }),
        )
        .await;
    app.create(
        &format!(
            "/api/v1/businesses/{}/debts/{}/payments",
            business_id,
            id_of(&sale["debt"])
        ),
        json!({ "amount": "10.00" }),
    )
    .await;

    let (status, _) = app
        .post(
            &format!("/api/v1/businesses/{}/sales/{}/void", business_id, id_of(&sale)),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.product_stock(business_id, chair).await, d!(2));

    // the customer now has history
    let (status, _) = app
        .call(
            axum::http::Method::DELETE,
            &format!("/api/v1/businesses/{}/customers/{}", business_id, customer_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn reports_refuse_ranges_over_a_year() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Pharmacy").await;

    let (status, _) = app
        .get(&format!(
            "/api/v1/businesses/{}/reports/sales?from=2024-01-01&to=2025-01-01",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get(&format!(
            "/api/v1/businesses/{}/reports/profit-and-loss?from=2024-01-01&to=2025-01-01",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .get(&format!(
            "/api/v1/businesses/{}/reports/sales?from=2024-01-01&to=2024-12-31",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use rust_decimal_macros::dec as d;
use serde_json::json;

#[tokio::test]
async fn category_names_are_unique_ignoring_case() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Grocer").await;
    let uri = format!("/api/v1/businesses/{}/categories", business_id);

    app.create(&uri, json!({ "name": "Beverages" })).await;
    let (status, body) = app.post(&uri, json!({ "name": "  beverages " })).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    // a different business may reuse the name
    let other_id = app.create_business("Second Grocer").await;
    app.create(
        &format!("/api/v1/businesses/{}/categories", other_id),
        json!({ "name": "Beverages" }),
    )
    .await;
}

#[tokio::test]
async fn product_crud_and_search() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Hardware").await;
    let base = format!("/api/v1/businesses/{}/products", business_id);

    let hammer = app
        .create(
            &base,
            json!({ "name": "Claw Hammer", "sku": "HM-01", "price": "12.50", "unit": "piece" }),
        )
        .await;
    let hammer_id = id_of(&hammer);
    assert_eq!(dec(&hammer["price"]), d!(12.50));
    assert_eq!(dec(&hammer["stock_quantity"]), d!(0));
    app.create_product(business_id, "Nails 1kg", "4.00", "2.50", "30")
        .await;

    let (status, found) = app.get(&format!("{}?search=hammer", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["pagination"]["total"], 1);
    assert_eq!(found["data"][0]["id"], hammer_id.to_string());

    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("{}/{}", base, hammer_id),
            Some(json!({ "price": "13.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(dec(&updated["price"]), d!(13.00));

    let (status, _) = app
        .call(Method::DELETE, &format!("{}/{}", base, hammer_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("{}/{}", base, hammer_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_price_is_rejected() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Hardware").await;

    let (status, _) = app
        .post(
            &format!("/api/v1/businesses/{}/products", business_id),
            json!({ "name": "Saw", "price": "-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_adjustments_cannot_go_negative() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Dairy").await;
    let product_id = app
        .create_product(business_id, "Yoghurt", "1.20", "0.70", "5")
        .await;
    let uri = format!(
        "/api/v1/businesses/{}/products/{}/stock",
        business_id, product_id
    );

    let (status, product) = app
        .post(&uri, json!({ "delta": "10", "reason": "delivery from farm" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", product);
    assert_eq!(dec(&product["stock_quantity"]), d!(15));

    let (status, _) = app
        .post(&uri, json!({ "delta": "-16", "reason": "spoiled" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.product_stock(business_id, product_id).await, d!(15));
}

#[tokio::test]
async fn low_stock_lists_products_at_or_below_reorder_level() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Pharmacy").await;
    app.create_product(business_id, "Plasters", "2.00", "1.00", "50")
        .await;
    let at_level = app
        .create_product(business_id, "Bandage", "3.00", "1.50", "2")
        .await;
    let below = app
        .create_product(business_id, "Gauze", "1.00", "0.40", "0")
        .await;

    let (status, low) = app
        .get(&format!(
            "/api/v1/businesses/{}/products/low-stock",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = low
        .as_array()
        .expect("array of products")
        .iter()
        .map(id_of)
        .collect();
    assert_eq!(ids, vec![below, at_level]);
}

#[tokio::test]
async fn deleting_a_category_detaches_its_products() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Bookshop").await;
    let category = app
        .create(
            &format!("/api/v1/businesses/{}/categories", business_id),
            json!({ "name": "Novels" }),
        )
        .await;
    let category_id = id_of(&category);

    let product = app
        .create(
            &format!("/api/v1/businesses/{}/products", business_id),
            json!({ "name": "Things Fall Apart", "price": "9.99", "category_id": category_id }),
        )
        .await;
    assert_eq!(product["category_id"], category_id.to_string());

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!(
                "/api/v1/businesses/{}/categories/{}",
                business_id, category_id
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["detached_products"], 1);

    let (_, product) = app
        .get(&format!(
            "/api/v1/businesses/{}/products/{}",
            business_id,
            id_of(&product)
        ))
        .await;
    assert!(product["category_id"].is_null());
}

#[tokio::test]
async fn customer_from_another_business_is_not_found() {
    let app = TestApp::new().await;
    let first = app.create_business("First").await;
    let second = app.create_business("Second").await;
    let customer_id = app.create_customer(first, "Neema").await;

    let (status, _) = app
        .get(&format!(
            "/api/v1/businesses/{}/customers/{}",
            second, customer_id
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn products_with_history_cannot_be_deleted() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Juice Bar").await;
    let juice = app
        .create_product(business_id, "Mango juice", "2.00", "0.80", "0")
        .await;
    let cups = app
        .create_product(business_id, "Cups", "0.10", "0.05", "50")
        .await;

    // a batch that makes the product counts as history
    app.create(
        &format!("/api/v1/businesses/{}/productions", business_id),
        json!({ "name": "Morning pressing", "product_id": juice }),
    )
    .await;
    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/businesses/{}/products/{}", business_id, juice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.create(
        &format!("/api/v1/businesses/{}/sales", business_id),
        json!({ "items": [{ "product_id": cups, "quantity": "5" }] }),
    )
    .await;
    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/businesses/{}/products/{}", business_id, cups),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // deactivating still works
    let (status, product) = app
        .call(
            Method::PUT,
            &format!("/api/v1/businesses/{}/products/{}", business_id, cups),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", product);
    assert_eq!(product["is_active"], false);
}

mod common;

use axum::http::{Method, StatusCode};
use common::*;
use rust_decimal_macros::dec as d;
use serde_json::{json, Value};
use uuid::Uuid;

async fn start_batch(app: &TestApp, business_id: Uuid, product_id: Uuid) -> Value {
    app.create(
        &format!("/api/v1/businesses/{}/productions", business_id),
        json!({
            "name": "Sunflower oil pressing",
            "batch_number": "OIL-001",
            "product_id": product_id,
            "planned_quantity": "40",
            "stages": ["Cleaning", "Pressing", "Bottling"],
        }),
    )
    .await
}

#[tokio::test]
async fn batch_is_created_with_ordered_stages() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Oil Mill").await;
    let oil = app
        .create_product(business_id, "Sunflower oil 1L", "4.00", "0", "0")
        .await;

    let batch = start_batch(&app, business_id, oil).await;
    assert_eq!(batch["status"], "planned");
    assert_eq!(batch["batch_number"], "OIL-001");
    let names: Vec<_> = batch["stages"]
        .as_array()
        .expect("stages")
        .iter()
        .map(|s| s["name"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["Cleaning", "Pressing", "Bottling"]);

    // batch numbers are unique within a business
    let (status, _) = app
        .post(
            &format!("/api/v1/businesses/{}/productions", business_id),
            json!({ "name": "Second run", "batch_number": "OIL-001" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn resources_labor_and_output_drive_costs_and_stock() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Oil Mill").await;
    let seeds = app
        .create_product(business_id, "Sunflower seeds 1kg", "1.00", "0.50", "200")
        .await;
    let oil = app
        .create_product(business_id, "Sunflower oil 1L", "4.00", "0", "0")
        .await;
    let employee = app
        .create(
            &format!("/api/v1/businesses/{}/employees", business_id),
            json!({ "name": "Pendo", "position": "Press operator", "hourly_rate": "2.50" }),
        )
        .await;

    let batch = start_batch(&app, business_id, oil).await;
    let base = format!(
        "/api/v1/businesses/{}/productions/{}",
        business_id,
        id_of(&batch)
    );

    let resource = app
        .create(
            &format!("{}/resources", base),
            json!({ "product_id": seeds, "quantity": "120", "consume_stock": true }),
        )
        .await;
    assert_eq!(resource["name"], "Sunflower seeds 1kg");
    assert_eq!(dec(&resource["unit_cost"]), d!(0.50));
    assert_eq!(app.product_stock(business_id, seeds).await, d!(80));

    app.create(
        &format!("{}/resources", base),
        json!({ "name": "Bottles", "quantity": "40", "unit_cost": "0.25" }),
    )
    .await;

    let labor = app
        .create(
            &format!("{}/labor", base),
            json!({ "employee_id": id_of(&employee), "description": "Pressing", "hours": "8" }),
        )
        .await;
    assert_eq!(dec(&labor["hourly_rate"]), d!(2.50));

    app.create(&format!("{}/outputs", base), json!({ "quantity": "40" }))
        .await;
    assert_eq!(app.product_stock(business_id, oil).await, d!(40));

    let (status, detail) = app.get(&base).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&detail["costs"]["material_cost"]), d!(70.00));
    assert_eq!(dec(&detail["costs"]["labor_cost"]), d!(20.00));
    assert_eq!(dec(&detail["costs"]["total_cost"]), d!(90.00));
    assert_eq!(dec(&detail["costs"]["cost_per_unit"]), d!(2.25));
}

#[tokio::test]
async fn consuming_more_than_stock_is_rejected() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Bakery").await;
    let flour = app
        .create_product(business_id, "Flour 1kg", "1.20", "0.80", "5")
        .await;
    let batch = app
        .create(
            &format!("/api/v1/businesses/{}/productions", business_id),
            json!({ "name": "Morning bread" }),
        )
        .await;

    let (status, _) = app
        .post(
            &format!(
                "/api/v1/businesses/{}/productions/{}/resources",
                business_id,
                id_of(&batch)
            ),
            json!({ "product_id": flour, "quantity": "6", "consume_stock": true }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.product_stock(business_id, flour).await, d!(5));
}

#[tokio::test]
async fn completion_waits_for_every_stage() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Oil Mill").await;
    let oil = app
        .create_product(business_id, "Sunflower oil 1L", "4.00", "0", "0")
        .await;
    let batch = start_batch(&app, business_id, oil).await;
    let base = format!(
        "/api/v1/businesses/{}/productions/{}",
        business_id,
        id_of(&batch)
    );
    let stage_ids: Vec<_> = batch["stages"]
        .as_array()
        .expect("stages")
        .iter()
        .map(id_of)
        .collect();

    // planned batches cannot jump to completed
    let (status, _) = app.post(&format!("{}/complete", base), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stage) = app
        .call(
            Method::PATCH,
            &format!("{}/stages/{}", base, stage_ids[0]),
            Some(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", stage);
    assert!(!stage["started_at"].is_null());

    let (_, detail) = app.get(&base).await;
    assert_eq!(detail["status"], "in_progress");

    let (status, _) = app.post(&format!("{}/complete", base), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a pending stage has to be started before it can finish
    let (status, _) = app
        .call(
            Method::PATCH,
            &format!("{}/stages/{}", base, stage_ids[1]),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for (i, stage_id) in stage_ids.iter().enumerate() {
        let steps: &[&str] = if i == 0 {
            &["completed"]
        } else {
            &["in_progress", "completed"]
        };
        for step in steps {
            let (status, body) = app
                .call(
                    Method::PATCH,
                    &format!("{}/stages/{}", base, stage_id),
                    Some(json!({ "status": step })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{}", body);
        }
    }

    let (status, completed) = app.post(&format!("{}/complete", base), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", completed);
    assert_eq!(completed["status"], "completed");
    assert!(!completed["end_date"].is_null());

    // closed batches take no more inputs
    let (status, _) = app
        .post(
            &format!("{}/outputs", base),
            json!({ "quantity": "1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_batch_returns_consumed_stock() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Soap Works").await;
    let lye = app
        .create_product(business_id, "Lye 1kg", "3.00", "2.00", "10")
        .await;
    let batch = app
        .create(
            &format!("/api/v1/businesses/{}/productions", business_id),
            json!({ "name": "Bar soap" }),
        )
        .await;
    let base = format!(
        "/api/v1/businesses/{}/productions/{}",
        business_id,
        id_of(&batch)
    );

    app.create(
        &format!("{}/resources", base),
        json!({ "product_id": lye, "quantity": "4", "consume_stock": true }),
    )
    .await;
    assert_eq!(app.product_stock(business_id, lye).await, d!(6));

    let (status, _) = app.call(Method::DELETE, &base, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.product_stock(business_id, lye).await, d!(10));
}

#[tokio::test]
async fn employees_with_logged_labor_cannot_be_deleted() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Carpentry").await;
    let employee = app
        .create(
            &format!("/api/v1/businesses/{}/employees", business_id),
            json!({ "name": "Musa", "hourly_rate": "3.00" }),
        )
        .await;
    let batch = app
        .create(
            &format!("/api/v1/businesses/{}/productions", business_id),
            json!({ "name": "Stools" }),
        )
        .await;
    app.create(
        &format!(
            "/api/v1/businesses/{}/productions/{}/labor",
            business_id,
            id_of(&batch)
        ),
        json!({ "employee_id": id_of(&employee), "description": "Sanding", "hours": "2" }),
    )
    .await;

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!(
                "/api/v1/businesses/{}/employees/{}",
                business_id,
                id_of(&employee)
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

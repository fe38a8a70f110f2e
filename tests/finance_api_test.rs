mod common;

use axum::http::{Method, StatusCode};
use common::*;
use rust_decimal_macros::dec as d;
use serde_json::json;

#[tokio::test]
async fn expenditures_draw_down_funding_sources() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Poultry Farm").await;

    let loan = app
        .create(
            &format!("/api/v1/businesses/{}/funding-sources", business_id),
            json!({
                "name": "Microfinance loan",
                "source_type": "loan",
                "amount": "1000.00",
                "received_on": "2025-02-01",
            }),
        )
        .await;
    let loan_id = id_of(&loan);
    assert_eq!(dec(&loan["remaining"]), d!(1000.00));

    let expenditures = format!("/api/v1/businesses/{}/expenditures", business_id);
    app.create(
        &expenditures,
        json!({
            "funding_source_id": loan_id,
            "category": "Feed",
            "description": "Layer mash, 10 bags",
            "amount": "400.00",
            "expense_date": "2025-02-03",
        }),
    )
    .await;
    app.create(
        &expenditures,
        json!({
            "funding_source_id": loan_id,
            "category": "feed",
            "description": "Grower mash",
            "amount": "250.00",
            "expense_date": "2025-02-10",
        }),
    )
    .await;

    let (status, body) = app
        .post(
            &expenditures,
            json!({
                "funding_source_id": loan_id,
                "category": "equipment",
                "description": "Incubator",
                "amount": "350.01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);

    let (status, source) = app
        .get(&format!(
            "/api/v1/businesses/{}/funding-sources/{}",
            business_id, loan_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&source["spent"]), d!(650.00));
    assert_eq!(dec(&source["remaining"]), d!(350.00));

    // a funding source in use cannot be deleted
    let (status, _) = app
        .call(
            Method::DELETE,
            &format!(
                "/api/v1/businesses/{}/funding-sources/{}",
                business_id, loan_id
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn expenditure_summary_groups_by_category_and_source() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Salon").await;
    let grant = app
        .create(
            &format!("/api/v1/businesses/{}/funding-sources", business_id),
            json!({ "name": "Youth grant", "source_type": "grant", "amount": "500" }),
        )
        .await;

    let expenditures = format!("/api/v1/businesses/{}/expenditures", business_id);
    for (category, amount, funded, date) in [
        ("rent", "200", true, "2025-05-01"),
        ("Utilities", "40", false, "2025-05-15"),
        ("utilities", "35", false, "2025-05-20"),
        ("rent", "200", true, "2025-06-01"),
    ] {
        let mut body = json!({
            "category": category,
            "description": format!("{} payment", category),
            "amount": amount,
            "expense_date": date,
        });
        if funded {
            body["funding_source_id"] = json!(id_of(&grant));
        }
        app.create(&expenditures, body).await;
    }

    let (status, summary) = app
        .get(&format!(
            "{}/summary?from=2025-05-01&to=2025-05-31",
            expenditures
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(dec(&summary["total"]), d!(275));
    assert_eq!(summary["count"], 3);
    assert_eq!(summary["by_category"][0]["category"], "rent");
    assert_eq!(summary["by_category"][1]["category"], "utilities");
    assert_eq!(dec(&summary["by_category"][1]["total"]), d!(75));
    assert_eq!(summary["by_category"][1]["count"], 2);
    assert_eq!(summary["by_funding_source"][0]["name"], "Youth grant");
    assert_eq!(summary["by_funding_source"][1]["name"], "Unfunded");
}

#[tokio::test]
async fn payments_settle_a_debt() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Hardware").await;
    let supplier = app
        .create(
            &format!("/api/v1/businesses/{}/suppliers", business_id),
            json!({ "name": "Cement Wholesalers" }),
        )
        .await;

    let debt = app
        .create(
            &format!("/api/v1/businesses/{}/debts", business_id),
            json!({
                "direction": "payable",
                "supplier_id": id_of(&supplier),
                "amount": "300.00",
                "due_date": "2025-07-31",
            }),
        )
        .await;
    assert_eq!(debt["status"], "outstanding");
    assert_eq!(debt["counterparty_name"], "Cement Wholesalers");
    let payments = format!(
        "/api/v1/businesses/{}/debts/{}/payments",
        business_id,
        id_of(&debt)
    );

    let detail = app
        .create(&payments, json!({ "amount": "120.00", "paid_on": "2025-07-01" }))
        .await;
    assert_eq!(detail["status"], "partially_paid");
    assert_eq!(dec(&detail["balance"]), d!(180.00));

    let (status, _) = app.post(&payments, json!({ "amount": "180.01" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let detail = app.create(&payments, json!({ "amount": "180.00" })).await;
    assert_eq!(detail["status"], "paid");
    assert_eq!(dec(&detail["balance"]), d!(0));
    assert_eq!(detail["payments"].as_array().map(Vec::len), Some(2));

    // settled debts take no more payments
    let (status, _) = app.post(&payments, json!({ "amount": "1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/businesses/{}/debts/{}", business_id, id_of(&debt)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn debts_need_a_counterparty_on_the_right_side() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Pharmacy").await;
    let customer_id = app.create_customer(business_id, "Halima").await;
    let debts = format!("/api/v1/businesses/{}/debts", business_id);

    let (status, _) = app
        .post(
            &debts,
            json!({ "direction": "payable", "customer_id": customer_id, "amount": "10" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(&debts, json!({ "direction": "receivable", "amount": "10" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let debt = app
        .create(
            &debts,
            json!({
                "direction": "receivable",
                "counterparty_name": "Walk-in neighbour",
                "amount": "10",
            }),
        )
        .await;

    let (status, written_off) = app
        .post(&format!("{}/{}/write-off", debts, id_of(&debt)), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(written_off["status"], "written_off");
}

#[tokio::test]
async fn debt_summary_splits_receivables_and_payables() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Wholesaler").await;
    let debts = format!("/api/v1/businesses/{}/debts", business_id);

    app.create(
        &debts,
        json!({ "direction": "receivable", "counterparty_name": "Shop A", "amount": "120" }),
    )
    .await;
    app.create(
        &debts,
        json!({ "direction": "receivable", "counterparty_name": "Shop B", "amount": "80" }),
    )
    .await;
    app.create(
        &debts,
        json!({
            "direction": "payable",
            "counterparty_name": "Mill",
            "amount": "500",
            "due_date": "2020-01-31",
        }),
    )
    .await;

    let (status, summary) = app.get(&format!("{}/summary", debts)).await;
    assert_eq!(status, StatusCode::OK, "{}", summary);
    assert_eq!(dec(&summary["receivable_outstanding"]), d!(200));
    assert_eq!(summary["receivable_count"], 2);
    assert_eq!(dec(&summary["payable_outstanding"]), d!(500));
    assert_eq!(summary["overdue_count"], 1);
}

#[tokio::test]
async fn profit_and_loss_subtracts_expenditures() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Juice Bar").await;
    let juice = app
        .create_product(business_id, "Mango juice", "3.00", "1.00", "50")
        .await;

    app.create(
        &format!("/api/v1/businesses/{}/sales", business_id),
        json!({
            "items": [{ "product_id": juice, "quantity": "10" }],
            "sold_at": "2025-08-05T12:00:00Z",
        }),
    )
    .await;
    app.create(
        &format!("/api/v1/businesses/{}/expenditures", business_id),
        json!({
            "category": "rent",
            "description": "August rent",
            "amount": "12.50",
            "expense_date": "2025-08-01",
        }),
    )
    .await;

    let (status, pnl) = app
        .get(&format!(
            "/api/v1/businesses/{}/reports/profit-and-loss?from=2025-08-01&to=2025-08-31",
            business_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", pnl);
    assert_eq!(dec(&pnl["revenue"]), d!(30.00));
    assert_eq!(dec(&pnl["cost_of_goods"]), d!(10.00));
    assert_eq!(dec(&pnl["gross_profit"]), d!(20.00));
    assert_eq!(dec(&pnl["total_expenditures"]), d!(12.50));
    assert_eq!(dec(&pnl["net_profit"]), d!(7.50));
}

#[tokio::test]
async fn funding_amount_cannot_drop_below_spending() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Tailor").await;
    let grant = app
        .create(
            &format!("/api/v1/businesses/{}/funding-sources", business_id),
            json!({ "name": "Startup grant", "source_type": "grant", "amount": "500.00" }),
        )
        .await;
    let grant_uri = format!(
        "/api/v1/businesses/{}/funding-sources/{}",
        business_id,
        id_of(&grant)
    );
    app.create(
        &format!("/api/v1/businesses/{}/expenditures", business_id),
        json!({
            "funding_source_id": id_of(&grant),
            "category": "equipment",
            "description": "Sewing machine",
            "amount": "300.00",
            "expense_date": "2025-04-02",
        }),
    )
    .await;

    let (status, _) = app
        .call(Method::PUT, &grant_uri, Some(json!({ "amount": "299.99" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .call(Method::PUT, &grant_uri, Some(json!({ "amount": "300.00" })))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(dec(&updated["remaining"]), d!(0));
}

#[tokio::test]
async fn concurrent_payments_cannot_overpay() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Fabrics").await;
    let customer = app
        .create(
            &format!("/api/v1/businesses/{}/customers", business_id),
            json!({ "name": "Mama Neema" }),
        )
        .await;
    let debt = app
        .create(
            &format!("/api/v1/businesses/{}/debts", business_id),
            json!({
                "direction": "receivable",
                "customer_id": id_of(&customer),
                "amount": "200.00",
            }),
        )
        .await;
    let payments = format!(
        "/api/v1/businesses/{}/debts/{}/payments",
        business_id,
        id_of(&debt)
    );

    let (first, second) = tokio::join!(
        app.post(&payments, json!({ "amount": "150.00" })),
        app.post(&payments, json!({ "amount": "150.00" })),
    );
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let (_, detail) = app
        .get(&format!("/api/v1/businesses/{}/debts/{}", business_id, id_of(&debt)))
        .await;
    assert_eq!(dec(&detail["amount_paid"]), d!(150.00));
    assert_eq!(dec(&detail["balance"]), d!(50.00));
    assert_eq!(detail["payments"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn suppliers_with_history_cannot_be_deleted() {
    let app = TestApp::new().await;
    let business_id = app.create_business("Grocer").await;
    let supplier = app
        .create(
            &format!("/api/v1/businesses/{}/suppliers", business_id),
            json!({ "name": "Valley Farms" }),
        )
        .await;
    app.create(
        &format!("/api/v1/businesses/{}/expenditures", business_id),
        json!({
            "supplier_id": id_of(&supplier),
            "category": "inventory",
            "description": "Tomatoes",
            "amount": "40.00",
            "expense_date": "2025-04-02",
        }),
    )
    .await;

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!(
                "/api/v1/businesses/{}/suppliers/{}",
                business_id,
                id_of(&supplier)
            ),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

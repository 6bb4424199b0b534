mod common;

use axum::http::{header, Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal, response_json, response_text, TestApp};

/// March 2024: two completed sales, a cancelled one, an approved and a rejected expense
async fn seed_march(app: &TestApp) {
    let unga = app.create_product("Unga wa Ugali 2kg", "190", "50").await;
    let sugar = app.create_product("Sugar 1kg", "160", "50").await;

    for (product_id, quantity, date) in [(unga, "2", "2024-03-04"), (sugar, "1", "2024-03-06")] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/sales",
                Some(json!({ "product_id": product_id, "quantity": quantity, "date": date })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = response_json(
        app.request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({ "product_id": sugar, "quantity": "3", "date": "2024-03-06" })),
        )
        .await,
    )
    .await;
    let cancelled = body["data"]["sale"]["id"].as_i64().expect("sale id");
    app.request_authenticated(
        Method::PUT,
        &format!("/api/sales/{cancelled}"),
        Some(json!({ "status": "cancelled" })),
    )
    .await;

    let body = response_json(
        app.request_authenticated(
            Method::POST,
            "/api/expenses",
            Some(json!({ "description": "Electricity", "category": "Utilities", "amount": "1500", "date": "2024-03-05" })),
        )
        .await,
    )
    .await;
    let approved = body["data"]["id"].as_i64().expect("expense id");
    app.request_authenticated(Method::POST, &format!("/api/expenses/{approved}/approve"), None)
        .await;

    let body = response_json(
        app.request_authenticated(
            Method::POST,
            "/api/expenses",
            Some(json!({ "description": "Duplicate receipt", "amount": "999", "date": "2024-03-05" })),
        )
        .await,
    )
    .await;
    let rejected = body["data"]["id"].as_i64().expect("expense id");
    app.request_authenticated(Method::POST, &format!("/api/expenses/{rejected}/reject"), None)
        .await;
}

#[tokio::test]
async fn weekly_report_totals_exclude_cancelled_and_rejected() {
    let app = TestApp::new().await;
    seed_march(&app).await;

    let response = app
        .request_authenticated(Method::GET, "/api/reports/weekly?start=2024-03-03", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let report = &body["data"];

    assert_eq!(report["period"]["start"], "2024-03-03");
    assert_eq!(report["period"]["end"], "2024-03-09");
    assert_eq!(decimal(&report["total_revenue"]), dec!(540));
    assert_eq!(decimal(&report["total_expenses"]), dec!(1500));
    assert_eq!(decimal(&report["net_profit"]), dec!(-960));
    assert_eq!(report["sales_count"], 2);
    assert_eq!(report["breakdown"].as_array().map(Vec::len), Some(7));
}

#[tokio::test]
async fn monthly_report_rejects_bad_month() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(Method::GET, "/api/reports/monthly?year=2024&month=13", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_report_rejects_inverted_range() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/custom?start_date=2024-03-31&end_date=2024-03-01",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_streams_csv_attachment() {
    let app = TestApp::new().await;
    seed_march(&app).await;

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/export?kind=sales&start_date=2024-03-01&end_date=2024-03-31",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii header")
        .to_string();
    assert_eq!(
        disposition,
        "attachment; filename=\"sales-2024-03-01-to-2024-03-31.csv\""
    );

    let csv = response_text(response).await;
    let mut lines = csv.lines();
    assert!(lines.next().expect("header").starts_with("id,date,product_name"));
    // Exports keep cancelled rows
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn payment_method_chart_groups_revenue() {
    let app = TestApp::new().await;
    seed_march(&app).await;

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/charts/payment-methods?start_date=2024-03-01&end_date=2024-03-31",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["labels"], json!(["cash"]));
}

#[tokio::test]
async fn top_products_chart_respects_limit() {
    let app = TestApp::new().await;
    seed_march(&app).await;

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/charts/top-products?start_date=2024-03-01&end_date=2024-03-31&limit=1",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["labels"], json!(["Unga wa Ugali 2kg"]));
}

#[tokio::test]
async fn report_ranges_are_capped_at_a_year() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/custom?start_date=1000-01-01&end_date=3000-12-31",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::GET,
            "/api/charts/sales?start_date=2020-01-01&end_date=2024-12-31",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A full leap year is still one report
    let response = app
        .request_authenticated(
            Method::GET,
            "/api/reports/custom?start_date=2024-01-01&end_date=2024-12-31",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

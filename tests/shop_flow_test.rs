mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal, response_json, TestApp};

#[tokio::test]
async fn product_crud_round_trip() {
    let app = TestApp::new().await;
    let id = app.create_product("Sugar 1kg", "160", "20").await;

    let response = app
        .request_authenticated(Method::GET, "/api/products", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let products = body["data"].as_array().expect("product list");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Sugar 1kg");

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(json!({ "price": "165" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["price"]), dec!(165));

    // The cached listing is dropped on update
    let body = response_json(
        app.request_authenticated(Method::GET, "/api/products", None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"][0]["price"]), dec!(165));

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/products/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/products/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_without_name_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/products",
            Some(json!({ "name": "", "price": "10" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cash_sale_decrements_stock() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Milk 500ml", "60", "10").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({ "product_id": product_id, "quantity": "3" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["sale"]["total"]), dec!(180));
    assert_eq!(body["data"]["sale"]["payment_method"], "cash");
    assert!(body["data"]["debt"].is_null());

    let body = response_json(
        app.request_authenticated(Method::GET, &format!("/api/products/{product_id}"), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["stock_quantity"]), dec!(7));
}

#[tokio::test]
async fn sale_beyond_stock_is_unprocessable() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Eggs (tray)", "450", "2").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({ "product_id": product_id, "quantity": "5" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn mpesa_sale_needs_a_code() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Bread 400g", "65", "10").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({ "product_id": product_id, "quantity": "1", "payment_method": "mpesa" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelling_a_sale_restores_stock() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Rice 1kg", "180", "10").await;

    let body = response_json(
        app.request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({ "product_id": product_id, "quantity": "4" })),
        )
        .await,
    )
    .await;
    let sale_id = body["data"]["sale"]["id"].as_i64().expect("sale id");

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/sales/{sale_id}"),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(
        app.request_authenticated(Method::GET, &format!("/api/products/{product_id}"), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["stock_quantity"]), dec!(10));

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/sales/{sale_id}"),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn debt_sale_opens_a_debt_and_payments_settle_it() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Cooking Oil 1L", "320", "10").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({
                "product_id": product_id,
                "quantity": "2",
                "payment_method": "debt",
                "customer_name": "Mama Wanjiku",
                "customer_phone": "0712345678",
                "date": "2024-03-05"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let debt = &body["data"]["debt"];
    assert_eq!(debt["customer_name"], "Mama Wanjiku");
    assert_eq!(decimal(&debt["balance"]), dec!(640));
    assert_eq!(debt["status"], "pending");
    assert_eq!(debt["due_date"], "2024-04-04");
    let debt_id = debt["id"].as_i64().expect("debt id");

    let payments_path = format!("/api/debts/{debt_id}/payments");

    let response = app
        .request_authenticated(
            Method::POST,
            &payments_path,
            Some(json!({ "amount": "700" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            &payments_path,
            Some(json!({ "amount": "240" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["debt"]["status"], "partial");
    assert_eq!(decimal(&body["data"]["debt"]["balance"]), dec!(400));

    let response = app
        .request_authenticated(
            Method::POST,
            &payments_path,
            Some(json!({ "amount": "400", "payment_method": "mpesa", "mpesa_code": "QWE123RTY" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["debt"]["status"], "paid");

    let body = response_json(
        app.request_authenticated(Method::GET, &format!("/api/debts/{debt_id}"), None)
            .await,
    )
    .await;
    assert_eq!(body["data"]["payments"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["is_overdue"], false);

    let body = response_json(
        app.request_authenticated(Method::GET, "/api/debts/summary", None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["total_outstanding"]), dec!(0));
    assert_eq!(decimal(&body["data"]["total_collected"]), dec!(640));
}

#[tokio::test]
async fn payments_on_missing_debt_are_not_found() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(Method::GET, "/api/debts/999/payments", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expense_can_be_decided_once() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/expenses",
            Some(json!({ "description": "Shop rent", "category": "Rent", "amount": "15000" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_i64().expect("expense id");

    let approve = format!("/api/expenses/{id}/approve");
    let response = app
        .request_authenticated(Method::POST, &approve, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "approved");
    assert!(body["data"]["approved_by"].is_number());

    let response = app
        .request_authenticated(Method::POST, &approve, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(Method::POST, &format!("/api/expenses/{id}/reject"), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_counts_todays_activity() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Tea Leaves 250g", "140", "3").await;

    app.request_authenticated(
        Method::POST,
        "/api/sales",
        Some(json!({ "product_id": product_id, "quantity": "1" })),
    )
    .await;
    app.request_authenticated(
        Method::POST,
        "/api/expenses",
        Some(json!({ "description": "Transport", "amount": "200" })),
    )
    .await;

    let response = app
        .request_authenticated(Method::GET, "/api/dashboard", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let data = &body["data"];
    assert_eq!(decimal(&data["today_revenue"]), dec!(140));
    assert_eq!(data["today_sales_count"], 1);
    assert_eq!(data["pending_expense_count"], 1);
    // 2 left against a minimum of 5
    assert_eq!(data["low_stock_count"], 1);
}

#[tokio::test]
async fn blank_text_fields_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/products",
            Some(json!({ "name": "   ", "price": "10" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/expenses",
            Some(json!({ "description": "\t ", "amount": "100" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/debts",
            Some(json!({ "customer_name": "  ", "amount": "100" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn low_stock_lists_products_at_or_below_minimum() {
    let app = TestApp::new().await;
    app.create_product("Salt 1kg", "40", "3").await;
    app.create_product("Matches (pack)", "30", "5").await;
    app.create_product("Soap Bar", "80", "20").await;

    let response = app
        .request_authenticated(Method::GET, "/api/products/low-stock", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("low stock list")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Salt 1kg", "Matches (pack)"]);
}

#[tokio::test]
async fn categories_are_distinct_and_sorted() {
    let app = TestApp::new().await;
    app.create_product("Sugar 1kg", "160", "10").await;
    app.create_product("Rice 1kg", "180", "10").await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/products",
            Some(json!({ "name": "Soda 500ml", "category": "Beverages", "price": "60" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response_json(
        app.request_authenticated(Method::GET, "/api/products/categories", None)
            .await,
    )
    .await;
    assert_eq!(body["data"], json!(["Beverages", "General"]));
}

#[tokio::test]
async fn stock_adjustment_cannot_go_negative() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Flour 2kg", "170", "10").await;
    let path = format!("/api/products/{product_id}/stock");

    let response = app
        .request_authenticated(Method::POST, &path, Some(json!({ "delta": "-100" })))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .request_authenticated(
            Method::POST,
            &path,
            Some(json!({ "delta": "5.5", "reason": "delivery" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["stock_quantity"]), dec!(15.5));

    // Emptying the shelf exactly is allowed
    let response = app
        .request_authenticated(Method::POST, &path, Some(json!({ "delta": "-15.5" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["stock_quantity"]), dec!(0));

    let response = app
        .request_authenticated(Method::POST, "/api/products/999/stock", Some(json!({ "delta": "-1" })))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_sale_restores_stock() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Maize Flour 2kg", "150", "8").await;

    let body = response_json(
        app.request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({ "product_id": product_id, "quantity": "3" })),
        )
        .await,
    )
    .await;
    let sale_id = body["data"]["sale"]["id"].as_i64().expect("sale id");

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/sales/{sale_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(
        app.request_authenticated(Method::GET, &format!("/api/products/{product_id}"), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["stock_quantity"]), dec!(8));

    let response = app
        .request_authenticated(Method::GET, &format!("/api/sales/{sale_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn credit_sale(app: &TestApp, product_id: i64) -> (i64, i64) {
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/sales",
            Some(json!({
                "product_id": product_id,
                "quantity": "2",
                "payment_method": "debt",
                "customer_name": "Baba Otieno"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    (
        body["data"]["sale"]["id"].as_i64().expect("sale id"),
        body["data"]["debt"]["id"].as_i64().expect("debt id"),
    )
}

#[tokio::test]
async fn cancelling_a_credit_sale_removes_its_unpaid_debt() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Sugar 2kg", "200", "10").await;
    let (sale_id, debt_id) = credit_sale(&app, product_id).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/sales/{sale_id}"),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/debts/{debt_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(app.request_authenticated(Method::GET, "/api/debts", None).await).await;
    assert_eq!(body["data"], json!([]));

    let body = response_json(
        app.request_authenticated(Method::GET, "/api/dashboard", None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["outstanding_debt"]), dec!(0));
}

#[tokio::test]
async fn credit_sale_with_payments_cannot_be_cancelled_or_deleted() {
    let app = TestApp::new().await;
    let product_id = app.create_product("Sugar 2kg", "200", "10").await;
    let (sale_id, debt_id) = credit_sale(&app, product_id).await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/debts/{debt_id}/payments"),
            Some(json!({ "amount": "100" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/sales/{sale_id}"),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/sales/{sale_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The rollback leaves both stock and the debt untouched
    let body = response_json(
        app.request_authenticated(Method::GET, &format!("/api/products/{product_id}"), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["stock_quantity"]), dec!(8));

    let body = response_json(
        app.request_authenticated(Method::GET, &format!("/api/debts/{debt_id}"), None)
            .await,
    )
    .await;
    assert_eq!(decimal(&body["data"]["balance"]), dec!(300));
}

#[tokio::test]
async fn debt_amount_cannot_drop_below_paid_and_debt_can_be_deleted() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/debts",
            Some(json!({ "customer_name": "Mzee Kamau", "amount": "500" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let debt_id = body["data"]["id"].as_i64().expect("debt id");
    let path = format!("/api/debts/{debt_id}");

    app.request_authenticated(
        Method::POST,
        &format!("{path}/payments"),
        Some(json!({ "amount": "300" })),
    )
    .await;

    let response = app
        .request_authenticated(Method::PUT, &path, Some(json!({ "amount": "200" })))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(Method::PUT, &path, Some(json!({ "amount": "300" })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "paid");
    assert_eq!(decimal(&body["data"]["balance"]), dec!(0));

    // A settled debt takes no further payment
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("{path}/payments"),
            Some(json!({ "amount": "1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(Method::DELETE, &path, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::GET, &path, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn debt_for_unknown_sale_is_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/debts",
            Some(json!({ "customer_name": "Mama Akinyi", "amount": "250", "sale_id": 999 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_expense_is_final() {
    let app = TestApp::new().await;
    let body = response_json(
        app.request_authenticated(
            Method::POST,
            "/api/expenses",
            Some(json!({ "description": "Broken scale", "amount": "2500" })),
        )
        .await,
    )
    .await;
    let id = body["data"]["id"].as_i64().expect("expense id");

    let response = app
        .request_authenticated(Method::POST, &format!("/api/expenses/{id}/reject"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "rejected");

    let response = app
        .request_authenticated(Method::POST, &format!("/api/expenses/{id}/approve"), None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Duka API",
        version = "0.1.0",
        description = r#"
# Duka grocery shop API

Backend for the shop dashboard: product catalogue and stock, sales (cash, M-Pesa and
credit), expenses with approval, customer debts and repayments, reports and chart data.

## Authentication

Every `/api` endpoint except `/api/auth/login` needs a bearer token from login:

```
Authorization: Bearer <token>
```

## Responses

Successful calls return `{ "success": true, "data": ..., "message": ... }`. Errors return
`{ "error", "message", "details", "timestamp" }` with a matching status code.

Amounts are in Kenya shillings; dates are calendar days in Africa/Nairobi.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login and current user"),
        (name = "products", description = "Catalogue and stock"),
        (name = "sales", description = "Recorded sales"),
        (name = "expenses", description = "Shop expenses and approval"),
        (name = "debts", description = "Customer debts and repayments"),
        (name = "dashboard", description = "Headline figures"),
        (name = "reports", description = "Period reports and CSV export"),
        (name = "charts", description = "Chart.js-shaped series"),
        (name = "health", description = "Liveness and dependency status")
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,

        crate::handlers::products::list_products,
        crate::handlers::products::low_stock,
        crate::handlers::products::categories,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::adjust_stock,

        crate::handlers::sales::list_sales,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::create_sale,
        crate::handlers::sales::update_sale,
        crate::handlers::sales::delete_sale,

        crate::handlers::expenses::list_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::create_expense,
        crate::handlers::expenses::update_expense,
        crate::handlers::expenses::delete_expense,
        crate::handlers::expenses::approve_expense,
        crate::handlers::expenses::reject_expense,

        crate::handlers::debts::list_debts,
        crate::handlers::debts::debt_summary,
        crate::handlers::debts::get_debt,
        crate::handlers::debts::create_debt,
        crate::handlers::debts::update_debt,
        crate::handlers::debts::delete_debt,
        crate::handlers::debts::list_payments,
        crate::handlers::debts::record_payment,

        crate::handlers::dashboard::dashboard,

        crate::handlers::reports::daily_report,
        crate::handlers::reports::weekly_report,
        crate::handlers::reports::monthly_report,
        crate::handlers::reports::custom_report,
        crate::handlers::reports::export_report,
        crate::handlers::reports::sales_chart,
        crate::handlers::reports::revenue_expenses_chart,
        crate::handlers::reports::profit_chart,
        crate::handlers::reports::expenses_by_category_chart,
        crate::handlers::reports::payment_methods_chart,
        crate::handlers::reports::top_products_chart,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::entities::PaymentMethod,
            crate::entities::SaleStatus,
            crate::entities::ExpenseStatus,
            crate::entities::DebtStatus,
            crate::backup::BackupFile,
            crate::health::HealthReport,
        )
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_shop_routes() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Duka API"));
        assert!(json.contains("/api/debts/{id}/payments"));
        assert!(json.contains("/api/reports/export"));
        assert!(json.contains("bearer_auth"));
    }
}

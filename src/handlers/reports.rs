use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    errors::ApiError,
    formatting::dates::{end_of_month, start_of_week, today},
    handlers::common::{map_service_error, success_response},
    reports::{ChartData, ChartGenerator, Period, Report, ReportError},
    services::reports::ExportKind,
    AppState,
};

const DEFAULT_CHART_DAYS: i64 = 30;
const DEFAULT_TOP_PRODUCTS: usize = 10;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeeklyQuery {
    /// First day of the week; defaults to the Sunday starting this week
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
    /// 1-12
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportQuery {
    pub kind: ExportKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ChartQuery {
    /// Bucket size for trend charts; defaults to day
    pub period: Option<Period>,
    /// Defaults to 30 days before `end_date`
    pub start_date: Option<NaiveDate>,
    /// Defaults to today
    pub end_date: Option<NaiveDate>,
    /// Number of products in the top products chart
    pub limit: Option<usize>,
}

impl ChartQuery {
    fn range(&self) -> (NaiveDate, NaiveDate) {
        let end = self.end_date.unwrap_or_else(today);
        let start = self
            .start_date
            .unwrap_or(end - Duration::days(DEFAULT_CHART_DAYS - 1));
        (start, end)
    }
}

async fn report_for(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Report, ApiError> {
    let generator = state
        .services
        .reports
        .generator(start, end)
        .await
        .map_err(map_service_error)?;
    Ok(generator.generate_report(start, end))
}

#[utoipa::path(
    get,
    path = "/api/reports/daily",
    params(DailyQuery),
    responses((status = 200, description = "Report for one day", body = Report)),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn daily_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = query.date.unwrap_or_else(today);
    Ok(success_response(report_for(&state, date, date).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/weekly",
    params(WeeklyQuery),
    responses((status = 200, description = "Report for seven days from `start`", body = Report)),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn weekly_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeeklyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let start = query.start.unwrap_or_else(|| start_of_week(today()));
    let end = start + Duration::days(6);
    let generator = state
        .services
        .reports
        .generator(start, end)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(generator.generate_weekly_report(start)))
}

#[utoipa::path(
    get,
    path = "/api/reports/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Report for a calendar month", body = Report),
        (status = 400, description = "Invalid month", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn monthly_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthlyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = today();
    let year = query.year.unwrap_or(now.year());
    let month = query.month.unwrap_or(now.month());
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(ReportError::InvalidMonth { year, month })
        .map_err(|e| map_service_error(e.into()))?;
    let generator = state
        .services
        .reports
        .generator(start, end_of_month(start))
        .await
        .map_err(map_service_error)?;
    let report = generator
        .generate_monthly_report(year, month)
        .map_err(|e| map_service_error(e.into()))?;
    Ok(success_response(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/custom",
    params(RangeQuery),
    responses(
        (status = 200, description = "Report for an inclusive date range", body = Report),
        (status = 400, description = "Reversed range, or longer than 366 days", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn custom_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let generator = state
        .services
        .reports
        .generator(query.start_date, query.end_date)
        .await
        .map_err(map_service_error)?;
    let report = generator
        .generate_custom_report(query.start_date, query.end_date)
        .map_err(|e| map_service_error(e.into()))?;
    Ok(success_response(report))
}

#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 400, description = "End date before start date", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn export_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = state
        .services
        .reports
        .export(query.kind, query.start_date, query.end_date)
        .await
        .map_err(map_service_error)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        query.kind.file_name(query.start_date, query.end_date)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

pub fn report_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/daily", get(daily_report))
        .route("/weekly", get(weekly_report))
        .route("/monthly", get(monthly_report))
        .route("/custom", get(custom_report))
        .route("/export", get(export_report))
}

/// Builds a chart over the query's date range
async fn chart(
    state: &AppState,
    query: &ChartQuery,
    shape: impl FnOnce(&ChartGenerator<'_>) -> ChartData,
) -> Result<ChartData, ApiError> {
    let (start, end) = query.range();
    let generator = state
        .services
        .reports
        .generator(start, end)
        .await
        .map_err(map_service_error)?;
    Ok(shape(&ChartGenerator::new(&generator)))
}

#[utoipa::path(
    get,
    path = "/api/charts/sales",
    params(ChartQuery),
    responses((status = 200, description = "Revenue per period", body = ChartData)),
    security(("bearer_auth" = [])),
    tag = "charts"
)]
pub async fn sales_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = query.period.unwrap_or_default();
    let data = chart(&state, &query, |c| c.sales_trend(period)).await?;
    Ok(success_response(data))
}

#[utoipa::path(
    get,
    path = "/api/charts/revenue-expenses",
    params(ChartQuery),
    responses((status = 200, description = "Revenue and expenses per period", body = ChartData)),
    security(("bearer_auth" = [])),
    tag = "charts"
)]
pub async fn revenue_expenses_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = query.period.unwrap_or_default();
    let data = chart(&state, &query, |c| c.revenue_vs_expenses(period)).await?;
    Ok(success_response(data))
}

#[utoipa::path(
    get,
    path = "/api/charts/profit",
    params(ChartQuery),
    responses((status = 200, description = "Net profit per period", body = ChartData)),
    security(("bearer_auth" = [])),
    tag = "charts"
)]
pub async fn profit_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = query.period.unwrap_or_default();
    let data = chart(&state, &query, |c| c.profit_trend(period)).await?;
    Ok(success_response(data))
}

#[utoipa::path(
    get,
    path = "/api/charts/expenses-by-category",
    params(ChartQuery),
    responses((status = 200, description = "Expense split by category", body = ChartData)),
    security(("bearer_auth" = [])),
    tag = "charts"
)]
pub async fn expenses_by_category_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let data = chart(&state, &query, |c| c.expenses_by_category()).await?;
    Ok(success_response(data))
}

#[utoipa::path(
    get,
    path = "/api/charts/payment-methods",
    params(ChartQuery),
    responses((status = 200, description = "Revenue split by payment method", body = ChartData)),
    security(("bearer_auth" = [])),
    tag = "charts"
)]
pub async fn payment_methods_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let data = chart(&state, &query, |c| c.payment_methods()).await?;
    Ok(success_response(data))
}

#[utoipa::path(
    get,
    path = "/api/charts/top-products",
    params(ChartQuery),
    responses((status = 200, description = "Best selling products by revenue", body = ChartData)),
    security(("bearer_auth" = [])),
    tag = "charts"
)]
pub async fn top_products_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS);
    let data = chart(&state, &query, |c| c.top_products(limit)).await?;
    Ok(success_response(data))
}

pub fn chart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales", get(sales_chart))
        .route("/revenue-expenses", get(revenue_expenses_chart))
        .route("/profit", get(profit_chart))
        .route("/expenses-by-category", get(expenses_by_category_chart))
        .route("/payment-methods", get(payment_methods_chart))
        .route("/top-products", get(top_products_chart))
}

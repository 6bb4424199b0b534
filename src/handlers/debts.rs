use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    entities::{debt, debt_payment},
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, message_response, success_response, validate_input,
    },
    services::debts::{
        CreateDebtRequest, DebtDetail, DebtFilter, DebtSummary, PaymentReceipt,
        RecordPaymentRequest, UpdateDebtRequest,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/debts",
    params(DebtFilter),
    responses(
        (status = 200, description = "Debts ordered by due date", body = [debt::Model]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn list_debts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DebtFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let debts = state
        .services
        .debts
        .list_debts(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(debts))
}

#[utoipa::path(
    get,
    path = "/api/debts/summary",
    responses(
        (status = 200, description = "Outstanding totals and status counts", body = DebtSummary)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn debt_summary(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state
        .services
        .debts
        .summary()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(summary))
}

#[utoipa::path(
    get,
    path = "/api/debts/{id}",
    params(("id" = i32, Path, description = "Debt id")),
    responses(
        (status = 200, description = "Debt with its payments", body = DebtDetail),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn get_debt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .debts
        .get_with_payments(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(detail))
}

#[utoipa::path(
    post,
    path = "/api/debts",
    request_body = CreateDebtRequest,
    responses(
        (status = 201, description = "Debt opened", body = debt::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn create_debt(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDebtRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let debt = state
        .services
        .debts
        .create_debt(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(debt))
}

#[utoipa::path(
    put,
    path = "/api/debts/{id}",
    params(("id" = i32, Path, description = "Debt id")),
    request_body = UpdateDebtRequest,
    responses(
        (status = 200, description = "Debt updated", body = debt::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn update_debt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDebtRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let debt = state
        .services
        .debts
        .update_debt(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(debt))
}

#[utoipa::path(
    delete,
    path = "/api/debts/{id}",
    params(("id" = i32, Path, description = "Debt id")),
    responses(
        (status = 200, description = "Debt and its payments deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn delete_debt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .debts
        .delete_debt(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Debt deleted"))
}

#[utoipa::path(
    get,
    path = "/api/debts/{id}/payments",
    params(("id" = i32, Path, description = "Debt id")),
    responses(
        (status = 200, description = "Payments, newest first", body = [debt_payment::Model]),
        (status = 404, description = "Debt not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let debts = &state.services.debts;
    debts.get_debt(id).await.map_err(map_service_error)?;
    let payments = debts.list_payments(id).await.map_err(map_service_error)?;
    Ok(success_response(payments))
}

#[utoipa::path(
    post,
    path = "/api/debts/{id}/payments",
    params(("id" = i32, Path, description = "Debt id")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentReceipt),
        (status = 400, description = "Amount not positive or above the balance", body = crate::errors::ErrorResponse),
        (status = 404, description = "Debt not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "debts"
)]
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let receipt = state
        .services
        .debts
        .record_payment(id, payload, Some(user.user_id))
        .await
        .map_err(map_service_error)?;
    Ok(created_response(receipt))
}

pub fn debt_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_debts).post(create_debt))
        .route("/summary", get(debt_summary))
        .route("/:id", get(get_debt).put(update_debt).delete(delete_debt))
        .route("/:id/payments", get(list_payments).post(record_payment))
}

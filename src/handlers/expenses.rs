use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::{
    auth::AuthUser,
    entities::expense,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, message_response, success_response, validate_input,
    },
    services::expenses::{CreateExpenseRequest, ExpenseFilter, UpdateExpenseRequest},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/expenses",
    params(ExpenseFilter),
    responses(
        (status = 200, description = "Expenses, newest first", body = [expense::Model]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let expenses = state
        .services
        .expenses
        .list_expenses(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expenses))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense", body = expense::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .services
        .expenses
        .get_expense(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expense))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded as pending", body = expense::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let expense = state
        .services
        .expenses
        .create_expense(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense id")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = expense::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let expense = state
        .services
        .expenses
        .update_expense(id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(("id" = i32, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .expenses
        .delete_expense(id)
        .await
        .map_err(map_service_error)?;
    Ok(message_response("Expense deleted"))
}

#[utoipa::path(
    post,
    path = "/api/expenses/{id}/approve",
    params(("id" = i32, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense approved", body = expense::Model),
        (status = 400, description = "Expense is not pending", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn approve_expense(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .services
        .expenses
        .approve_expense(id, user.user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expense))
}

#[utoipa::path(
    post,
    path = "/api/expenses/{id}/reject",
    params(("id" = i32, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense rejected", body = expense::Model),
        (status = 400, description = "Expense is not pending", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "expenses"
)]
pub async fn reject_expense(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = state
        .services
        .expenses
        .reject_expense(id, user.user_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(expense))
}

pub fn expense_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/:id/approve", post(approve_expense))
        .route("/:id/reject", post(reject_expense))
}

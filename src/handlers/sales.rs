use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{
    entities::sale,
    errors::ApiError,
    handlers::common::{
        created_response, map_service_error, message_response, success_response, validate_input,
    },
    services::sales::{CreateSaleRequest, SaleFilter, SaleReceipt, UpdateSaleRequest},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/sales",
    params(SaleFilter),
    responses(
        (status = 200, description = "Sales, newest first", body = [sale::Model]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = state
        .services
        .sales
        .list_sales(filter)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sales))
}

#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    params(("id" = i32, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale", body = sale::Model),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(sale))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale recorded; debt sales also return the new debt", body = SaleReceipt),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Not enough stock", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let receipt = state
        .services
        .sales
        .create_sale(payload)
        .await
        .map_err(map_service_error)?;
    // Stock changed underneath the cached catalogue
    state.services.products.invalidate_list().await;
    Ok(created_response(receipt))
}

#[utoipa::path(
    put,
    path = "/api/sales/{id}",
    params(("id" = i32, Path, description = "Sale id")),
    request_body = UpdateSaleRequest,
    responses(
        (status = 200, description = "Sale updated", body = sale::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn update_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSaleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    let sale = state
        .services
        .sales
        .update_sale(id, payload)
        .await
        .map_err(map_service_error)?;
    state.services.products.invalidate_list().await;
    Ok(success_response(sale))
}

#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    params(("id" = i32, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale deleted and stock restored"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "sales"
)]
pub async fn delete_sale(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .sales
        .delete_sale(id)
        .await
        .map_err(map_service_error)?;
    state.services.products.invalidate_list().await;
    Ok(message_response("Sale deleted"))
}

pub fn sale_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/:id", get(get_sale).put(update_sale).delete(delete_sale))
}

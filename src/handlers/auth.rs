use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    auth::{AuthError, AuthUser, LoginRequest, TokenResponse, UserProfile},
    errors::ApiError,
    handlers::common::{message_response, success_response, validate_input},
    AppState,
};

/// Errors from the auth endpoints keep their own status codes
pub enum AuthHandlerError {
    Api(ApiError),
    Auth(AuthError),
}

impl From<ApiError> for AuthHandlerError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<AuthError> for AuthHandlerError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl IntoResponse for AuthHandlerError {
    fn into_response(self) -> Response {
        match self {
            Self::Api(err) => err.into_response(),
            Self::Auth(err) => err.into_response(),
        }
    }
}

/// Login handler
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed token and the user's profile", body = TokenResponse),
        (status = 400, description = "Missing username or password", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 403, description = "Account disabled", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthHandlerError> {
    validate_input(&payload)?;
    let token = state.auth.login(&payload).await?;
    Ok(success_response(token))
}

/// Tokens are stateless; the client discards its copy
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(user: AuthUser) -> impl IntoResponse {
    info!(user_id = user.user_id, token_id = %user.token_id, "User logged out");
    message_response("Logged out")
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserProfile),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let profile = state.auth.current_user(&user).await?;
    Ok(success_response(profile))
}

/// Login, open to anonymous callers. Merged into the `/api` router.
pub fn public_auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/login", post(login))
}

/// Routes that need a bearer token. Merged, not nested, so they can share the
/// `/auth` prefix with login.
pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

//! Duka API library
//!
//! Backend for a grocery shop dashboard: product catalogue and stock, sales,
//! expenses, customer debts, reports and chart data, plus backup tooling.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod backup;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod formatting;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod openapi;
pub mod reports;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use utoipa::ToSchema;

use crate::{
    auth::{AuthConfig, AuthService},
    cache::CacheBackend,
    config::AppConfig,
    db::DbPool,
    handlers::AppServices,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub cache: Arc<dyn CacheBackend>,
    pub services: AppServices,
    pub auth: Arc<AuthService>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires services and auth over one connection pool and cache
    pub fn new(config: AppConfig, db: Arc<DbPool>, cache: Arc<dyn CacheBackend>) -> Self {
        let services = AppServices::new(
            db.clone(),
            cache.clone(),
            Duration::from_secs(config.redis.default_ttl_secs),
        );
        let auth = Arc::new(AuthService::new(
            AuthConfig::new(
                config.jwt_secret.clone(),
                Duration::from_secs(config.jwt_expiration_secs),
            ),
            db.clone(),
        ));
        Self {
            db,
            config,
            cache,
            services,
            auth,
            started_at: Instant::now(),
        }
    }
}

/// Success envelope shared by every JSON endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// The `/api` surface. Everything except login sits behind the bearer token check.
pub fn api_routes(auth: Arc<AuthService>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .nest("/products", handlers::products::product_routes())
        .nest("/sales", handlers::sales::sale_routes())
        .nest("/expenses", handlers::expenses::expense_routes())
        .nest("/debts", handlers::debts::debt_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .nest("/reports", handlers::reports::report_routes())
        .nest("/charts", handlers::reports::chart_routes())
        .merge(handlers::auth::auth_routes())
        .route_layer(middleware::from_fn_with_state(auth, auth::auth_middleware));

    protected.merge(handlers::auth::public_auth_routes())
}

/// CORS from the comma-separated allow list; permissive in development when unset
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.is_development() {
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full application router: API, health, Swagger UI and the shared middleware stack
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();

    Router::new()
        .route("/", get(|| async { "duka-api up" }))
        .route("/health", get(health::health_check))
        .nest("/api", api_routes(auth))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(Arc::new(state))
}

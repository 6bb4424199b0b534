#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use duka_api::{cache::InMemoryCache, config, db, AppState};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "sokoni-2024";

/// Application wired over a throwaway SQLite file with an admin account
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("duka.db").display());

        let mut cfg = config::load_config_with(|key| match key {
            "APP_ENV" => Some("development".to_string()),
            "DATABASE_URL" => Some(db_url.clone()),
            _ => None,
        })
        .expect("test configuration");
        cfg.redis.enabled = false;
        cfg.database.max_connections = 1;
        cfg.database.min_connections = 1;
        cfg.jwt_secret = "integration-test-secret-of-at-least-32-characters".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("sqlite pool");
        db::run_migrations(&pool).await.expect("migrations");

        let state = AppState::new(cfg, Arc::new(pool), Arc::new(InMemoryCache::new()));
        state
            .auth
            .create_admin(ADMIN_USERNAME, "admin@duka.test", ADMIN_PASSWORD)
            .await
            .expect("admin user");

        let router = duka_api::app_router(state.clone());
        let mut app = Self {
            router,
            state,
            token: String::new(),
            _dir: dir,
        };
        app.token = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        app
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/login",
                Some(json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed");
        let body = response_json(response).await;
        body["data"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    pub async fn request_authenticated(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, path, body, Some(&self.token)).await
    }

    /// Creates a product and returns its id
    pub async fn create_product(&self, name: &str, price: &str, stock: &str) -> i64 {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/products",
                Some(json!({
                    "name": name,
                    "category": "General",
                    "price": price,
                    "stock_quantity": stock,
                    "min_stock": "5"
                })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        body["data"]["id"].as_i64().expect("product id")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn response_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Decimals travel as JSON strings
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}

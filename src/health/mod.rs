//! Liveness endpoint reporting database and cache status.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::{cache::CacheBackend, db::DbPool, AppState};

const CACHE_CHECK_KEY: &str = "health:check";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthDetail {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthDetail {
    fn new(status: HealthStatus, message: Option<String>) -> Self {
        Self { status, message }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: BTreeMap<String, HealthDetail>,
}

impl HealthReport {
    /// Down if any component is down, degraded if any is degraded
    pub fn overall(details: &BTreeMap<String, HealthDetail>) -> HealthStatus {
        if details.values().any(|d| d.status == HealthStatus::Down) {
            HealthStatus::Down
        } else if details.values().any(|d| d.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        }
    }
}

async fn check_database(db: &DbPool) -> HealthDetail {
    match db.ping().await {
        Ok(()) => HealthDetail::new(HealthStatus::Up, None),
        Err(e) => {
            error!("Database health check failed: {}", e);
            HealthDetail::new(HealthStatus::Down, Some("database unreachable".to_string()))
        }
    }
}

/// The cache never takes the service down; falling back to memory is reported as degraded
async fn check_cache(cache: &dyn CacheBackend, redis_enabled: bool) -> HealthDetail {
    let backend = cache.backend();
    match cache.exists(CACHE_CHECK_KEY).await {
        Ok(_) if redis_enabled && backend != "redis" => HealthDetail::new(
            HealthStatus::Degraded,
            Some(format!("redis unavailable, using {} cache", backend)),
        ),
        Ok(_) => HealthDetail::new(HealthStatus::Up, Some(backend.to_string())),
        Err(e) => {
            warn!("Cache health check failed: {}", e);
            HealthDetail::new(HealthStatus::Degraded, Some(e.to_string()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service up, possibly degraded", body = HealthReport),
        (status = 503, description = "Database down", body = HealthReport)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut details = BTreeMap::new();
    details.insert("database".to_string(), check_database(&state.db).await);
    details.insert(
        "cache".to_string(),
        check_cache(state.cache.as_ref(), state.config.redis.enabled).await,
    );

    let status = HealthReport::overall(&details);
    let report = HealthReport {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        details,
    };

    let code = match status {
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Up | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    #[test]
    fn any_down_component_takes_the_service_down() {
        let mut details = BTreeMap::new();
        details.insert("cache".into(), HealthDetail::new(HealthStatus::Degraded, None));
        assert_eq!(HealthReport::overall(&details), HealthStatus::Degraded);

        details.insert("database".into(), HealthDetail::new(HealthStatus::Down, None));
        assert_eq!(HealthReport::overall(&details), HealthStatus::Down);
    }

    #[tokio::test]
    async fn memory_fallback_is_degraded_when_redis_was_wanted() {
        let cache = InMemoryCache::new();
        assert_eq!(check_cache(&cache, true).await.status, HealthStatus::Degraded);
        assert_eq!(check_cache(&cache, false).await.status, HealthStatus::Up);
    }
}

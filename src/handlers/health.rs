use crate::{
    models::HealthStatus,
    services::{Analytics, CacheService},
    stores::EventStore,
};
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct HealthState {
    pub cache: Arc<CacheService>,
    pub events: Arc<dyn EventStore>,
    pub analytics: Arc<Analytics>,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthStatus> {
    let cache_ok = state.cache.ping().await;
    // A clean "not found" still proves the store answers.
    let store_ok = state.events.get_by_id("health-probe").await.is_ok();

    let status = if cache_ok && store_ok {
        "healthy"
    } else if store_ok {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: cache_ok,
        store: store_ok,
        uptime_seconds: state.analytics.uptime_seconds(),
        timestamp: Utc::now(),
    })
}

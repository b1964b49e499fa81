//! 存活与就绪探针

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::{db, middleware::AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<HealthCheck>,
}

#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

static APP_START_TIME: OnceLock<Instant> = OnceLock::new();

/// 进程启动时调用一次，之后的调用无效果
pub fn set_start_time() {
    APP_START_TIME.get_or_init(Instant::now);
}

pub fn get_uptime() -> u64 {
    APP_START_TIME.get().map_or(0, |start| start.elapsed().as_secs())
}

/// 存活探针，不触达数据库
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: env!("CARGO_PKG_NAME"),
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}

fn check(name: &str, status: db::HealthStatus) -> HealthCheck {
    match status {
        db::HealthStatus::Healthy => HealthCheck {
            name: name.to_string(),
            status: "healthy".to_string(),
            message: None,
        },
        db::HealthStatus::Unhealthy(msg) => HealthCheck {
            name: name.to_string(),
            status: "unhealthy".to_string(),
            message: Some(msg),
        },
    }
}

/// 就绪探针
/// 数据库不可达或迁移未完成时返回 503
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut checks = vec![check("database", db::health_check(&state.db).await)];
    if checks[0].message.is_none() {
        checks.push(check("schema", db::schema_check(&state.db).await));
    }

    let ready = checks.iter().all(|c| c.message.is_none());
    let status = if ready {
        StatusCode::OK
    } else {
        tracing::warn!(?checks, "Service not ready");
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ReadinessResponse { ready, checks }))
}

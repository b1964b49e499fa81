//! PostgreSQL 连接池、内嵌迁移与就绪检查

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// 编译期内嵌的迁移脚本
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Could not connect to the cover database");
            DbError::ConnectionFailed(e.to_string())
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Cover database pool ready"
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let known = MIGRATOR.iter().count();
    tracing::info!(migrations = known, "Applying schema migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Schema migration failed");
        DbError::MigrationFailed(e.to_string())
    })?;

    Ok(())
}

/// 连通性检查
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable");
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

/// 已应用的迁移是否覆盖了内嵌的全部版本
///
/// 滚动发布时新实例可能先于迁移就绪，此时不应接流量
pub async fn schema_check(pool: &PgPool) -> HealthStatus {
    let applied: Vec<i64> = match sqlx::query_scalar(
        "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version",
    )
    .fetch_all(pool)
    .await
    {
        Ok(versions) => versions,
        Err(e) => return HealthStatus::Unhealthy(e.to_string()),
    };

    let missing = missing_versions(MIGRATOR.iter().map(|m| m.version), &applied);
    if missing.is_empty() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy(format!("pending migrations: {:?}", missing))
    }
}

fn missing_versions(expected: impl Iterator<Item = i64>, applied: &[i64]) -> Vec<i64> {
    expected.filter(|v| applied.binary_search(v).is_err()).collect()
}

/// 连接池指标，由 /metrics 拉取时刷新
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("cover_db_pool_connections").set(pool.size() as f64);
    metrics::gauge!("cover_db_pool_idle").set(pool.num_idle() as f64);
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

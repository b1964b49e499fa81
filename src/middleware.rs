//! HTTP 中间件
//! 请求追踪、请求级事务、IP 白名单

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::JwtService;
use crate::authz::ResourceRegistry;
use crate::error::{AppError, Result};
use crate::events::{DomainEvent, EventBus, EventQueue};
use crate::services::{ClaimService, ItemService, LedgerService};

/// 应用状态
///
/// 服务与注册表用 Arc 包装，请求之间共享，Clone 只是指针拷贝
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::AppConfig,
    pub db: PgPool,
    /// 启动时构建，之后只读
    pub registry: Arc<ResourceRegistry>,
    pub event_bus: Arc<EventBus>,
    pub jwt_service: Arc<JwtService>,
    pub item_service: Arc<ItemService>,
    pub claim_service: Arc<ClaimService>,
    pub ledger_service: Arc<LedgerService>,
}

impl AppState {
    pub fn new(config: crate::config::AppConfig, db: PgPool, event_bus: Arc<EventBus>) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);
        Ok(Self {
            item_service: Arc::new(ItemService::new(config.coverage.clone())),
            claim_service: Arc::new(ClaimService::new()),
            ledger_service: Arc::new(LedgerService::new()),
            registry: Arc::new(ResourceRegistry::standard()),
            jwt_service,
            event_bus,
            config,
            db,
        })
    }
}

/// 请求级数据库事务
///
/// 授权检查和处理器共用同一个事务；处理器产生的事件暂存在这里，
/// 提交成功后才发布
#[derive(Clone)]
pub struct RequestTx {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
    events: EventQueue,
}

impl RequestTx {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        let tx = pool.begin().await?;
        Ok(Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            events: EventQueue::new(),
        })
    }

    /// 获取事务连接；事务结束后调用返回内部错误
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, PgConnection>> {
        let guard = self.tx.lock().await;
        MutexGuard::try_map(guard, |slot| slot.as_deref_mut())
            .map_err(|_| AppError::internal_error("request transaction already finished"))
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// 提交并取出待发布事件
    pub async fn commit(&self) -> Result<Vec<DomainEvent>> {
        let tx = self.tx.lock().await.take();
        if let Some(tx) = tx {
            tx.commit().await?;
        }
        Ok(self.events.drain())
    }

    /// 回滚并丢弃待发布事件
    pub async fn rollback(&self) -> Result<()> {
        let tx = self.tx.lock().await.take();
        let discarded = self.events.drain().len();
        if discarded > 0 {
            tracing::debug!(discarded, "Discarding events of rolled back request");
        }
        if let Some(tx) = tx {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for RequestTx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<RequestTx>()
            .cloned()
            .ok_or_else(|| AppError::internal_error("request transaction missing"))
    }
}

/// 事务中间件
/// 响应状态码 < 400 时提交并发布事件，否则回滚
pub async fn transaction_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let tx = RequestTx::begin(&state.db).await?;
    req.extensions_mut().insert(tx.clone());

    let response = next.run(req).await;

    if response.status().as_u16() < 400 {
        let events = tx.commit().await?;
        state.event_bus.publish_all(events);
    } else if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "Failed to roll back request transaction");
    }

    Ok(response)
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();

        // 指标标签只用静态字符串
        let status = response.status().as_u16();
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "UNKNOWN",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            204 => "204",
            400 => "400",
            401 => "401",
            404 => "404",
            409 => "409",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// IP 白名单中间件
pub async fn ip_whitelist_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if let Some(allowed_ips) = &state.config.security.allowed_ips {
        let client_ip = get_client_ip(req.headers(), state.config.security.trust_proxy);

        if !allowed_ips.contains(&client_ip) {
            tracing::warn!(client_ip = %client_ip, "IP not in whitelist");
            return Err(AppError::not_authorized("client address not in whitelist"));
        }

        tracing::debug!(client_ip = %client_ip, "IP allowed by whitelist");
    }

    Ok(next.run(req).await)
}

/// 获取客户端 IP 地址
fn get_client_ip(headers: &HeaderMap, trust_proxy: bool) -> String {
    if trust_proxy {
        // X-Forwarded-For 可能包含多个 IP，取第一个
        if let Some(first_ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
        {
            return first_ip.trim().to_string();
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            return real_ip.to_string();
        }
    }

    "unknown".to_string()
}

//! 账务报表处理器，仅管理员可达

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;

use super::PageQuery;
use crate::{
    auth::Actor,
    error::AppError,
    middleware::{AppState, RequestTx},
    models::ledger::{CreateLedgerReportRequest, LedgerReport},
};

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page.bounded();
    let mut conn = tx.acquire().await?;
    let reports = state.ledger_service.list(&mut conn, limit, offset).await?;
    Ok(Json(json!({
        "reports": reports,
        "count": reports.len()
    })))
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Json(req): Json<CreateLedgerReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let report = state.ledger_service.create_report(&mut conn, &actor, &req).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// 分发器已加载报表，直接返回
pub async fn get_report(Extension(report): Extension<LedgerReport>) -> Json<LedgerReport> {
    Json(report)
}

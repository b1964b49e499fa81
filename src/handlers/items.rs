//! 物品处理器

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::PageQuery;
use crate::{
    auth::Actor,
    error::AppError,
    middleware::{AppState, RequestTx},
    models::item::*,
    repository::ItemRepository,
    services::item_service::ItemRemoval,
};

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    pub status: Option<CoverageStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ItemListQuery {
    fn page(&self) -> PageQuery {
        PageQuery {
            limit: self.limit.unwrap_or(50),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// 全部物品（审核队列），仅管理员可达
pub async fn list_items(
    tx: RequestTx,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = query.page().bounded();
    let mut conn = tx.acquire().await?;
    let items = ItemRepository::list_all(&mut conn, query.status, limit, offset).await?;
    Ok(Json(json!({
        "items": items,
        "count": items.len()
    })))
}

pub async fn get_item(Extension(item): Extension<Item>) -> Json<Item> {
    Json(item)
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(item): Extension<Item>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let item = state.item_service.update(&mut conn, &item, &req).await?;
    Ok(Json(item))
}

/// 删除物品；已生效的物品可能改为停保
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(item): Extension<Item>,
) -> Result<Response, AppError> {
    let mut conn = tx.acquire().await?;
    let removal = state.item_service.remove(&mut conn, tx.events(), &actor, &item).await?;

    Ok(match removal {
        ItemRemoval::Deleted(_) => StatusCode::NO_CONTENT.into_response(),
        ItemRemoval::Inactivated(item) => Json(item).into_response(),
    })
}

pub async fn submit_item(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(item): Extension<Item>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let item = state.item_service.submit(&mut conn, tx.events(), &actor, &item).await?;
    Ok(Json(item))
}

pub async fn approve_item(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(item): Extension<Item>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let item = state.item_service.approve(&mut conn, tx.events(), &actor, &item).await?;
    Ok(Json(item))
}

pub async fn deny_item(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(item): Extension<Item>,
    Json(req): Json<StatusReasonRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let item = state
        .item_service
        .deny(&mut conn, tx.events(), &actor, &item, &req.reason)
        .await?;
    Ok(Json(item))
}

pub async fn request_item_revision(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(item): Extension<Item>,
    Json(req): Json<StatusReasonRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let item = state
        .item_service
        .request_revision(&mut conn, tx.events(), &actor, &item, &req.reason)
        .await?;
    Ok(Json(item))
}

//! 理赔处理器

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::PageQuery;
use crate::{
    auth::Actor,
    authz::SubResource,
    error::AppError,
    middleware::{AppState, RequestTx},
    models::{claim::*, claim_item::CreateClaimItemRequest, item::StatusReasonRequest},
    repository::{ClaimItemRepository, ClaimRepository},
};

#[derive(Debug, Deserialize)]
pub struct ClaimListQuery {
    pub status: Option<ClaimStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 全部理赔（审核队列），仅管理员可达
pub async fn list_claims(
    tx: RequestTx,
    Query(query): Query<ClaimListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = PageQuery {
        limit: query.limit.unwrap_or(50),
        offset: query.offset.unwrap_or(0),
    }
    .bounded();
    let mut conn = tx.acquire().await?;
    let claims = ClaimRepository::list_all(&mut conn, query.status, limit, offset).await?;
    Ok(Json(json!({
        "claims": claims,
        "count": claims.len()
    })))
}

/// 理赔详情，附带理赔项
pub async fn get_claim(
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let claim_items = ClaimItemRepository::list_by_claim(&mut conn, claim.id).await?;
    Ok(Json(json!({
        "claim": claim,
        "claim_items": claim_items
    })))
}

pub async fn update_claim(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
    Json(req): Json<UpdateClaimRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let claim = state.claim_service.update(&mut conn, &claim, &req).await?;
    Ok(Json(claim))
}

pub async fn delete_claim(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
) -> Result<StatusCode, AppError> {
    let mut conn = tx.acquire().await?;
    state.claim_service.delete(&mut conn, &claim).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_claim_item(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
    Json(req): Json<CreateClaimItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let claim_item = state.claim_service.add_item(&mut conn, &claim, &req).await?;
    Ok((StatusCode::CREATED, Json(claim_item)))
}

async fn run_action(
    state: &AppState,
    actor: &Actor,
    tx: &RequestTx,
    claim: &Claim,
    sub_resource: SubResource,
    reason: Option<&str>,
) -> Result<Json<Claim>, AppError> {
    let mut conn = tx.acquire().await?;
    let claim = state
        .claim_service
        .act(&mut conn, tx.events(), actor, claim, sub_resource, reason)
        .await?;
    Ok(Json(claim))
}

pub async fn submit_claim(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
) -> Result<Json<Claim>, AppError> {
    run_action(&state, &actor, &tx, &claim, SubResource::Submit, None).await
}

pub async fn approve_claim(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
) -> Result<Json<Claim>, AppError> {
    run_action(&state, &actor, &tx, &claim, SubResource::Approve, None).await
}

pub async fn preapprove_claim(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
) -> Result<Json<Claim>, AppError> {
    run_action(&state, &actor, &tx, &claim, SubResource::Preapprove, None).await
}

/// 要求补充票据
pub async fn request_claim_receipt(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
    Json(req): Json<StatusReasonRequest>,
) -> Result<Json<Claim>, AppError> {
    req.validate()?;
    run_action(&state, &actor, &tx, &claim, SubResource::Receipt, Some(&req.reason)).await
}

pub async fn request_claim_revision(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
    Json(req): Json<StatusReasonRequest>,
) -> Result<Json<Claim>, AppError> {
    req.validate()?;
    run_action(&state, &actor, &tx, &claim, SubResource::Revision, Some(&req.reason)).await
}

pub async fn deny_claim(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim): Extension<Claim>,
    Json(req): Json<StatusReasonRequest>,
) -> Result<Json<Claim>, AppError> {
    req.validate()?;
    run_action(&state, &actor, &tx, &claim, SubResource::Deny, Some(&req.reason)).await
}

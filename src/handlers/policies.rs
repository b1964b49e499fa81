//! 保单处理器，包括保单下的物品、理赔、受抚养人、成员和记过

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use super::PageQuery;
use crate::{
    auth::Actor,
    error::AppError,
    middleware::{AppState, RequestTx},
    models::{
        claim::CreateClaimRequest,
        item::CreateItemRequest,
        policy::*,
    },
    repository::{
        ClaimRepository, ItemRepository, PolicyDependentRepository, PolicyRepository,
        StrikeRepository,
    },
};

/// 列出保单；管理员看到全部，其他用户只看到自己所在的保单
pub async fn list_policies(
    actor: Actor,
    tx: RequestTx,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let policies = if actor.is_admin() {
        let (limit, offset) = page.bounded();
        PolicyRepository::list_all(&mut conn, limit, offset).await?
    } else {
        PolicyRepository::list_for_user(&mut conn, actor.id).await?
    };

    Ok(Json(json!({
        "policies": policies,
        "count": policies.len()
    })))
}

/// 创建保单，创建者自动成为成员
pub async fn create_policy(
    actor: Actor,
    tx: RequestTx,
    Json(req): Json<CreatePolicyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let policy = PolicyRepository::create(&mut conn, &req, actor.id).await?;

    tracing::info!(policy_id = %policy.id, user_id = %actor.id, "Policy created");
    Ok((StatusCode::CREATED, Json(policy)))
}

pub async fn get_policy(Extension(policy): Extension<Policy>) -> Json<Policy> {
    Json(policy)
}

pub async fn update_policy(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
    Json(req): Json<UpdatePolicyRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let policy = PolicyRepository::update(&mut conn, policy.id, &req).await?;
    Ok(Json(policy))
}

pub async fn list_policy_items(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let items = ItemRepository::list_by_policy(&mut conn, policy.id).await?;
    Ok(Json(json!({
        "items": items,
        "count": items.len()
    })))
}

pub async fn create_policy_item(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let item = state.item_service.create(&mut conn, policy.id, &req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_policy_claims(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let claims = ClaimRepository::list_by_policy(&mut conn, policy.id).await?;
    Ok(Json(json!({
        "claims": claims,
        "count": claims.len()
    })))
}

pub async fn create_policy_claim(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
    Json(req): Json<CreateClaimRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let claim = state.claim_service.create(&mut conn, policy.id, &req).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn list_policy_dependents(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let dependents = PolicyDependentRepository::list_by_policy(&mut conn, policy.id).await?;
    Ok(Json(json!({
        "dependents": dependents,
        "count": dependents.len()
    })))
}

pub async fn create_policy_dependent(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
    Json(req): Json<DependentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let dependent = PolicyDependentRepository::create(&mut conn, policy.id, &req).await?;
    Ok((StatusCode::CREATED, Json(dependent)))
}

pub async fn list_policy_members(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let members = PolicyRepository::list_members(&mut conn, policy.id).await?;
    Ok(Json(json!({
        "members": members,
        "count": members.len()
    })))
}

pub async fn list_policy_strikes(
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let strikes = StrikeRepository::list_by_policy(&mut conn, policy.id).await?;
    Ok(Json(json!({
        "strikes": strikes,
        "count": strikes.len()
    })))
}

/// 记过，仅管理员
pub async fn create_policy_strike(
    actor: Actor,
    tx: RequestTx,
    Extension(policy): Extension<Policy>,
    Json(req): Json<StrikeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let strike = StrikeRepository::create(&mut conn, policy.id, &req).await?;

    tracing::info!(policy_id = %policy.id, strike_id = %strike.id, admin_id = %actor.id, "Strike recorded");
    Ok((StatusCode::CREATED, Json(strike)))
}

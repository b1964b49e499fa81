//! 理赔项处理器

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::{
    auth::Actor,
    error::AppError,
    middleware::{AppState, RequestTx},
    models::claim_item::{ClaimItem, UpdateClaimItemRequest},
};

pub async fn get_claim_item(Extension(claim_item): Extension<ClaimItem>) -> Json<ClaimItem> {
    Json(claim_item)
}

pub async fn update_claim_item(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    tx: RequestTx,
    Extension(claim_item): Extension<ClaimItem>,
    Json(req): Json<UpdateClaimItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = tx.acquire().await?;
    let claim_item = state
        .claim_service
        .update_claim_item(&mut conn, &actor, &claim_item, &req)
        .await?;
    Ok(Json(claim_item))
}

pub async fn delete_claim_item(
    State(state): State<Arc<AppState>>,
    tx: RequestTx,
    Extension(claim_item): Extension<ClaimItem>,
) -> Result<StatusCode, AppError> {
    let mut conn = tx.acquire().await?;
    state.claim_service.delete_claim_item(&mut conn, &claim_item).await?;
    Ok(StatusCode::NO_CONTENT)
}

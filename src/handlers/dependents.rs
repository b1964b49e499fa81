//! 受抚养人处理器

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::RequestTx,
    models::policy::{DependentRequest, PolicyDependent},
    repository::PolicyDependentRepository,
};

pub async fn get_dependent(Extension(dependent): Extension<PolicyDependent>) -> Json<PolicyDependent> {
    Json(dependent)
}

pub async fn update_dependent(
    tx: RequestTx,
    Extension(dependent): Extension<PolicyDependent>,
    Json(req): Json<DependentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let dependent = PolicyDependentRepository::update(&mut conn, dependent.id, &req).await?;
    Ok(Json(dependent))
}

/// 删除受抚养人；仍有物品引用时拒绝
pub async fn delete_dependent(
    tx: RequestTx,
    Extension(dependent): Extension<PolicyDependent>,
) -> Result<StatusCode, AppError> {
    let mut conn = tx.acquire().await?;
    if !PolicyDependentRepository::delete(&mut conn, dependent.id).await? {
        return Err(AppError::not_found("policy dependent"));
    }
    Ok(StatusCode::NO_CONTENT)
}

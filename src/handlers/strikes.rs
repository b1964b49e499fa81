//! 记过处理器，写操作仅管理员可达

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::RequestTx,
    models::policy::{Strike, StrikeRequest},
    repository::StrikeRepository,
};

pub async fn get_strike(Extension(strike): Extension<Strike>) -> Json<Strike> {
    Json(strike)
}

pub async fn update_strike(
    tx: RequestTx,
    Extension(strike): Extension<Strike>,
    Json(req): Json<StrikeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let mut conn = tx.acquire().await?;
    let strike = StrikeRepository::update(&mut conn, strike.id, &req).await?;
    Ok(Json(strike))
}

pub async fn delete_strike(
    tx: RequestTx,
    Extension(strike): Extension<Strike>,
) -> Result<StatusCode, AppError> {
    let mut conn = tx.acquire().await?;
    if !StrikeRepository::delete(&mut conn, strike.id).await? {
        return Err(AppError::not_found("strike"));
    }
    Ok(StatusCode::NO_CONTENT)
}

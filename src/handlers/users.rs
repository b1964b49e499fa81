//! 用户处理器

use axum::{extract::Query, response::IntoResponse, Extension, Json};
use serde_json::json;
use validator::Validate;

use super::PageQuery;
use crate::{
    auth::Actor,
    error::AppError,
    middleware::RequestTx,
    models::user::{UpdateUserRequest, User},
    repository::UserRepository,
};

/// 当前用户，不经过授权分发器
pub async fn me(actor: Actor) -> Json<User> {
    Json(actor.0)
}

/// 用户列表，仅管理员可达
pub async fn list_users(
    tx: RequestTx,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = page.bounded();
    let mut conn = tx.acquire().await?;
    let users = UserRepository::list(&mut conn, limit, offset).await?;
    Ok(Json(json!({
        "users": users,
        "count": users.len()
    })))
}

pub async fn get_user(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// 更新用户资料；角色只能由管理员修改
pub async fn update_user(
    actor: Actor,
    tx: RequestTx,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let app_role = match req.app_role {
        Some(role) if actor.is_admin() => Some(role),
        Some(_) => return Err(AppError::not_authorized("only admins can change roles")),
        None => None,
    };

    let mut conn = tx.acquire().await?;
    let user = UserRepository::update(&mut conn, user.id, &req, app_role).await?;

    if app_role.is_some() {
        tracing::info!(user_id = %user.id, app_role = ?user.app_role, changed_by = %actor.id, "User role changed");
    }
    Ok(Json(user))
}

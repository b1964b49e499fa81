//! Bearer 认证中间件
//! 校验访问令牌，加载用户并以 Actor 形式挂到请求扩展上

use crate::{error::AppError, middleware::AppState, models::user::User, repository::UserRepository};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 当前认证用户
///
/// 独立的新类型，避免和授权分发器发布的目标 `User` 资源混淆
#[derive(Debug, Clone)]
pub struct Actor(pub User);

impl std::ops::Deref for Actor {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

// 处理器中可以直接提取 Actor
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers())?;
    let claims = state.jwt_service.validate_access_token(&token)?;
    let user_id = claims.user_id()?;

    let mut conn = state.db.acquire().await?;
    let user = UserRepository::find_by_id(&mut conn, user_id)
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = %user_id, "Token subject has no user record");
            AppError::Unauthorized
        })?;
    drop(conn);

    req.extensions_mut().insert(Actor(user));

    Ok(next.run(req).await)
}

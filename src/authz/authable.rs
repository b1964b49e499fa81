//! Authable capability
//! 受保护资源的授权能力
//!
//! 分发器保护的每种资源都实现这个 trait；不带 ID 的集合请求用零值（`Default`）代替。

use async_trait::async_trait;
use axum::http::{Method, Uri};
use sqlx::PgConnection;
use uuid::Uuid;

use super::permission::{Permission, SubResource};
use crate::error::Result;
use crate::models::user::User;

/// 决策可能用到的原始请求信息
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
}

impl RequestMeta {
    pub fn new(method: &Method, uri: &Uri) -> Self {
        Self {
            method: method.clone(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
        }
    }
}

#[async_trait]
pub trait Authable: Default + Clone + Send + Sync + 'static {
    /// 按主键加载；不存在返回 `AppError::NotFound`，其他错误原样上抛
    async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Self>;

    /// 零值返回 nil
    fn id(&self) -> Uuid;

    /// `actor` 能否在资源当前状态下执行 `permission`/`sub_resource`。
    /// 决策依赖的查询失败作为错误返回，不当作拒绝
    async fn is_actor_allowed_to(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        permission: Permission,
        sub_resource: SubResource,
        req: &RequestMeta,
    ) -> Result<bool>;
}

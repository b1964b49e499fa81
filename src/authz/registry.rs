//! Resource registry
//! 路径第一段映射到封闭的资源种类集合；启动时构建一次，经应用状态交给分发器

use axum::http::Extensions;
use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;

use super::authable::{Authable, RequestMeta};
use super::permission::{Permission, SubResource};
use crate::error::{AppError, Result};
use crate::models::{
    Claim, ClaimItem, Item, LedgerReport, Policy, PolicyDependent, PolicyUser, Strike, User,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Policy,
    PolicyDependent,
    PolicyUser,
    User,
    Item,
    Claim,
    ClaimItem,
    Strike,
    LedgerReport,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Policy,
        ResourceKind::PolicyDependent,
        ResourceKind::PolicyUser,
        ResourceKind::User,
        ResourceKind::Item,
        ResourceKind::Claim,
        ResourceKind::ClaimItem,
        ResourceKind::Strike,
        ResourceKind::LedgerReport,
    ];

    /// 该种类对应的 URL 段
    pub fn path_name(&self) -> &'static str {
        match self {
            ResourceKind::Policy => "policies",
            ResourceKind::PolicyDependent => "policy-dependents",
            ResourceKind::PolicyUser => "policy-members",
            ResourceKind::User => "users",
            ResourceKind::Item => "items",
            ResourceKind::Claim => "claims",
            ResourceKind::ClaimItem => "claim-items",
            ResourceKind::Strike => "strikes",
            ResourceKind::LedgerReport => "ledger-reports",
        }
    }
}

/// 单次授权检查的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
    /// ID 不存在；对调用方与 `Denied` 完全一致
    Missing,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    kinds: HashMap<String, ResourceKind>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, kind: ResourceKind) -> Self {
        self.kinds.insert(name.into(), kind);
        self
    }

    /// 按标准路径名注册全部种类
    pub fn standard() -> Self {
        ResourceKind::ALL
            .into_iter()
            .fold(Self::new(), |registry, kind| registry.register(kind.path_name(), kind))
    }

    pub fn resolve(&self, name: &str) -> Option<ResourceKind> {
        self.kinds.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// 加载 `kind` 的目标资源（`id` 为 `None` 时用零值）并判定，
/// 放行时把加载好的资源放进 `extensions` 供处理器使用
pub async fn check_kind(
    kind: ResourceKind,
    conn: &mut PgConnection,
    actor: &User,
    id: Option<Uuid>,
    permission: Permission,
    sub_resource: SubResource,
    req: &RequestMeta,
    extensions: &mut Extensions,
) -> Result<Decision> {
    macro_rules! check {
        ($ty:ty) => {
            check::<$ty>(conn, actor, id, permission, sub_resource, req, extensions).await
        };
    }

    match kind {
        ResourceKind::Policy => check!(Policy),
        ResourceKind::PolicyDependent => check!(PolicyDependent),
        ResourceKind::PolicyUser => check!(PolicyUser),
        ResourceKind::User => check!(User),
        ResourceKind::Item => check!(Item),
        ResourceKind::Claim => check!(Claim),
        ResourceKind::ClaimItem => check!(ClaimItem),
        ResourceKind::Strike => check!(Strike),
        ResourceKind::LedgerReport => check!(LedgerReport),
    }
}

async fn check<T: Authable>(
    conn: &mut PgConnection,
    actor: &User,
    id: Option<Uuid>,
    permission: Permission,
    sub_resource: SubResource,
    req: &RequestMeta,
    extensions: &mut Extensions,
) -> Result<Decision> {
    let resource = match id {
        Some(id) => match T::find_by_id(conn, id).await {
            Ok(resource) => resource,
            Err(AppError::NotFound(what)) => {
                tracing::debug!(resource = %what, "Authorization target not found");
                return Ok(Decision::Missing);
            }
            Err(e) => return Err(e),
        },
        None => T::default(),
    };

    if !resource
        .is_actor_allowed_to(conn, actor, permission, sub_resource, req)
        .await?
    {
        return Ok(Decision::Denied);
    }

    extensions.insert(resource);
    Ok(Decision::Allowed)
}

//! HTTP 处理器模块
//! 授权分发器已经加载并校验过目标资源，处理器从请求扩展中取用

use serde::Deserialize;

use crate::error::AppError;

pub mod claim_items;
pub mod claims;
pub mod dependents;
pub mod health;
pub mod items;
pub mod ledger_reports;
pub mod members;
pub mod metrics;
pub mod policies;
pub mod strikes;
pub mod users;

/// 受保护路由的兜底处理器
///
/// 未知子资源在授权分发器处已被拒绝；能走到这里的只剩分发器放行但没有对应路由的路径，
/// 同样按未授权处理，不暴露资源是否存在
pub async fn unmatched_resource() -> AppError {
    AppError::not_authorized("no route for this resource path")
}

/// 分页参数
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl PageQuery {
    /// 限制单页大小
    pub fn bounded(&self) -> (i64, i64) {
        (self.limit.clamp(1, 200), self.offset.max(0))
    }
}

fn default_limit() -> i64 {
    50
}

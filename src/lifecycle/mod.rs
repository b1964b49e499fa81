//! 生命周期状态机
//! 物品、理赔、理赔项的状态迁移表与操作门控表
//!
//! 每张表只列出允许的组合，未列出的组合一律拒绝。

pub mod claim;
pub mod claim_item;
pub mod item;

use std::fmt::Display;

use crate::error::AppError;

/// 同状态更新总是合法，否则 `to` 必须在 `targets` 中
pub fn check_transition<S>(entity: &'static str, from: S, to: S, targets: &[S]) -> Result<(), AppError>
where
    S: Copy + PartialEq + Display,
{
    if from == to || targets.contains(&to) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(entity, from, to))
    }
}

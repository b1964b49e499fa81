//! 保单成员处理器

use axum::{http::StatusCode, Extension, Json};

use crate::{
    auth::Actor,
    error::AppError,
    middleware::RequestTx,
    models::policy::PolicyUser,
    repository::PolicyRepository,
};

pub async fn get_member(Extension(member): Extension<PolicyUser>) -> Json<PolicyUser> {
    Json(member)
}

/// 移除成员；保单至少保留一名成员
pub async fn delete_member(
    actor: Actor,
    tx: RequestTx,
    Extension(member): Extension<PolicyUser>,
) -> Result<StatusCode, AppError> {
    let mut conn = tx.acquire().await?;
    if PolicyRepository::count_members(&mut conn, member.policy_id).await? <= 1 {
        return Err(AppError::validation("a policy must keep at least one member"));
    }
    if !PolicyRepository::delete_member(&mut conn, member.id).await? {
        return Err(AppError::not_found("policy member"));
    }

    tracing::info!(
        policy_id = %member.policy_id,
        user_id = %member.user_id,
        removed_by = %actor.id,
        "Policy member removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

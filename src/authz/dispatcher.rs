//! Authorization dispatcher middleware
//! 在认证和请求事务之后运行；任何拒绝（包括不存在的 ID）都统一报 `ErrorNotAuthorized`

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::authable::RequestMeta;
use super::path::parse_resource_path;
use super::permission::Permission;
use super::registry::{check_kind, Decision};
use crate::auth::Actor;
use crate::error::AppError;
use crate::middleware::{AppState, RequestTx};
use crate::telemetry;

pub async fn authorize(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = parse_resource_path(req.uri().path())?;

    let kind = state.registry.resolve(&path.resource).ok_or_else(|| {
        AppError::internal_error(&format!("no resource registered for '{}'", path.resource))
    })?;

    let Actor(actor) = req
        .extensions()
        .get::<Actor>()
        .cloned()
        .ok_or_else(|| AppError::internal_error("authorization ran without an authenticated actor"))?;

    let permission = Permission::from_method(req.method(), path.id.is_some());
    let meta = RequestMeta::new(req.method(), req.uri());

    let decision = if permission == Permission::Denied {
        Decision::Denied
    } else {
        let tx = req
            .extensions()
            .get::<RequestTx>()
            .cloned()
            .ok_or_else(|| AppError::internal_error("authorization ran without a request transaction"))?;
        let mut conn = tx.acquire().await?;
        check_kind(
            kind,
            &mut conn,
            &actor,
            path.id,
            permission,
            path.sub_resource,
            &meta,
            req.extensions_mut(),
        )
        .await?
    };

    telemetry::record_authz_decision(kind.path_name(), decision.is_allowed());

    if !decision.is_allowed() {
        tracing::warn!(
            actor_id = %actor.id,
            resource = kind.path_name(),
            resource_id = ?path.id,
            permission = permission.as_str(),
            sub_resource = path.sub_resource.as_str(),
            missing = decision == Decision::Missing,
            "Authorization denied"
        );
        return Err(AppError::not_authorized(&format!(
            "{} {} on {}",
            permission,
            path.sub_resource,
            kind.path_name()
        )));
    }

    Ok(next.run(req).await)
}

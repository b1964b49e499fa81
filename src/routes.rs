//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    handler::Handler,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::jwt_auth_middleware,
    authz::{authorize, path::API_PREFIX},
    handlers,
    middleware::{
        ip_whitelist_middleware, request_tracking_middleware, transaction_middleware, AppState,
    },
};

/// 受授权分发器保护的资源路由
fn resource_routes() -> Router<Arc<AppState>> {
    Router::new()
        // 保单
        .route(
            "/policies",
            get(handlers::policies::list_policies).post(handlers::policies::create_policy),
        )
        .route(
            "/policies/{id}",
            get(handlers::policies::get_policy).put(handlers::policies::update_policy),
        )
        .route(
            "/policies/{id}/items",
            get(handlers::policies::list_policy_items).post(handlers::policies::create_policy_item),
        )
        .route(
            "/policies/{id}/claims",
            get(handlers::policies::list_policy_claims).post(handlers::policies::create_policy_claim),
        )
        .route(
            "/policies/{id}/dependents",
            get(handlers::policies::list_policy_dependents)
                .post(handlers::policies::create_policy_dependent),
        )
        .route("/policies/{id}/members", get(handlers::policies::list_policy_members))
        .route(
            "/policies/{id}/strikes",
            get(handlers::policies::list_policy_strikes).post(handlers::policies::create_policy_strike),
        )

        // 物品
        .route("/items", get(handlers::items::list_items))
        .route(
            "/items/{id}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route("/items/{id}/submit", post(handlers::items::submit_item))
        .route("/items/{id}/approve", post(handlers::items::approve_item))
        .route("/items/{id}/deny", post(handlers::items::deny_item))
        .route("/items/{id}/revision", post(handlers::items::request_item_revision))

        // 理赔
        .route("/claims", get(handlers::claims::list_claims))
        .route(
            "/claims/{id}",
            get(handlers::claims::get_claim)
                .put(handlers::claims::update_claim)
                .delete(handlers::claims::delete_claim),
        )
        .route("/claims/{id}/submit", post(handlers::claims::submit_claim))
        .route("/claims/{id}/approve", post(handlers::claims::approve_claim))
        .route("/claims/{id}/preapprove", post(handlers::claims::preapprove_claim))
        .route("/claims/{id}/receipt", post(handlers::claims::request_claim_receipt))
        .route("/claims/{id}/revision", post(handlers::claims::request_claim_revision))
        .route("/claims/{id}/deny", post(handlers::claims::deny_claim))
        .route("/claims/{id}/items", post(handlers::claims::add_claim_item))
        .route(
            "/claim-items/{id}",
            get(handlers::claim_items::get_claim_item)
                .put(handlers::claim_items::update_claim_item)
                .delete(handlers::claim_items::delete_claim_item),
        )

        // 受抚养人与成员
        .route(
            "/policy-dependents/{id}",
            get(handlers::dependents::get_dependent)
                .put(handlers::dependents::update_dependent)
                .delete(handlers::dependents::delete_dependent),
        )
        .route(
            "/policy-members/{id}",
            get(handlers::members::get_member).delete(handlers::members::delete_member),
        )

        // 用户
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/{id}",
            get(handlers::users::get_user).put(handlers::users::update_user),
        )

        // 记过
        .route(
            "/strikes/{id}",
            get(handlers::strikes::get_strike)
                .put(handlers::strikes::update_strike)
                .delete(handlers::strikes::delete_strike),
        )

        // 账务报表
        .route(
            "/ledger-reports",
            get(handlers::ledger_reports::list_reports).post(handlers::ledger_reports::create_report),
        )
        .route("/ledger-reports/{id}", get(handlers::ledger_reports::get_report))
}

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_export));

    // route_layer 后添加的在外层：认证 -> 事务 -> 授权
    // route_layer 不作用于未匹配的请求，兜底处理器单独套上同一组中间件，
    // 这样 /items/{id}/bogus 之类的路径也要先认证再由分发器拒绝
    let fallback = handlers::unmatched_resource
        .layer(from_fn_with_state(state.clone(), authorize))
        .layer(from_fn_with_state(state.clone(), transaction_middleware))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let protected = resource_routes()
        .route_layer(from_fn_with_state(state.clone(), authorize))
        .route_layer(from_fn_with_state(state.clone(), transaction_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .fallback(fallback);

    // 当前用户只需认证
    let me = Router::new()
        .route("/users/me", get(handlers::users::me))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .nest(API_PREFIX, me.merge(protected))
        .layer(from_fn_with_state(state.clone(), ip_whitelist_middleware))
        .layer(from_fn(request_tracking_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

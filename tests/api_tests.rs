//! HTTP 端到端测试
//!
//! 需要 PostgreSQL：设置 TEST_DATABASE_URL 后运行 `cargo test -- --ignored`

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use cover_system::{models::AppRole, routes::create_router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

struct TestApp {
    app: Router,
    config: cover_system::config::AppConfig,
    pool: sqlx::PgPool,
}

impl TestApp {
    async fn new() -> Self {
        let config = common::create_test_config();
        let pool = common::setup_test_db(&config).await;
        let state = common::create_test_app_state(config.clone(), pool.clone());
        Self {
            app: create_router(state),
            config,
            pool,
        }
    }

    async fn send(&self, method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

// ==================== 公开端点 ====================

#[tokio::test]
#[ignore]
#[serial]
async fn test_health_endpoint() {
    let app = TestApp::new().await;
    let (status, json) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_readiness_endpoint() {
    let app = TestApp::new().await;
    let (status, json) = app.send(Method::GET, "/ready", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
}

// ==================== 认证 ====================

#[tokio::test]
#[ignore]
#[serial]
async fn test_missing_token_is_unauthenticated() {
    let app = TestApp::new().await;
    let (status, json) = app.send(Method::GET, "/api/v1/policies", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["key"], "ErrorNotAuthenticated");
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_me_returns_actor() {
    let app = TestApp::new().await;
    let user = common::insert_user(&app.pool, AppRole::User).await;
    let auth = common::bearer(&app.config, &user);

    let (status, json) = app.send(Method::GET, "/api/v1/users/me", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], user.id.to_string());
}

// ==================== 授权分发 ====================

#[tokio::test]
#[ignore]
#[serial]
async fn test_unknown_id_and_foreign_policy_look_the_same() {
    let app = TestApp::new().await;
    let owner = common::insert_user(&app.pool, AppRole::User).await;
    let outsider = common::insert_user(&app.pool, AppRole::User).await;

    let (status, policy) = app
        .send(
            Method::POST,
            "/api/v1/policies",
            Some(&common::bearer(&app.config, &owner)),
            Some(json!({ "name": "Smith household" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let outsider_auth = common::bearer(&app.config, &outsider);
    let (foreign_status, foreign) = app
        .send(Method::GET, &format!("/api/v1/policies/{}", policy["id"].as_str().unwrap()), Some(&outsider_auth), None)
        .await;
    let (missing_status, missing) = app
        .send(Method::GET, &format!("/api/v1/policies/{}", Uuid::new_v4()), Some(&outsider_auth), None)
        .await;

    assert_eq!(foreign_status, StatusCode::NOT_FOUND);
    assert_eq!(missing_status, StatusCode::NOT_FOUND);
    assert_eq!(foreign["error"]["key"], "ErrorNotAuthorized");
    assert_eq!(foreign["error"]["message"], missing["error"]["message"]);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_malformed_id_is_bad_request() {
    let app = TestApp::new().await;
    let user = common::insert_user(&app.pool, AppRole::User).await;
    let (status, json) = app
        .send(Method::POST, "/api/v1/items/not-a-uuid/submit", Some(&common::bearer(&app.config, &user)), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["key"], "ErrorMalformedResourceId");
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_ledger_reports_admin_only() {
    let app = TestApp::new().await;
    let member = common::insert_user(&app.pool, AppRole::User).await;
    let admin = common::insert_user(&app.pool, AppRole::Admin).await;
    let period = json!({ "period_start": "2024-01-01", "period_end": "2024-12-31" });

    let (status, _) = app
        .send(Method::POST, "/api/v1/ledger-reports", Some(&common::bearer(&app.config, &member)), Some(period.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, report) = app
        .send(Method::POST, "/api/v1/ledger-reports", Some(&common::bearer(&app.config, &admin)), Some(period))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(report["entry_count"], 0);
}

// ==================== 物品与理赔流程 ====================

#[tokio::test]
#[ignore]
#[serial]
async fn test_item_and_claim_lifecycle() {
    let app = TestApp::new().await;
    let member = common::insert_user(&app.pool, AppRole::User).await;
    let steward = common::insert_user(&app.pool, AppRole::Steward).await;
    let signator = common::insert_user(&app.pool, AppRole::Signator).await;
    let category_id = common::insert_category(&app.pool, 100_000).await;

    let member_auth = common::bearer(&app.config, &member);
    let steward_auth = common::bearer(&app.config, &steward);
    let signator_auth = common::bearer(&app.config, &signator);

    let (_, policy) = app
        .send(Method::POST, "/api/v1/policies", Some(&member_auth), Some(json!({ "name": "Jones household" })))
        .await;
    let policy_id = policy["id"].as_str().unwrap().to_string();

    // 保额低于阈值，提交即自动批准
    let (status, item) = app
        .send(
            Method::POST,
            &format!("/api/v1/policies/{}/items", policy_id),
            Some(&member_auth),
            Some(json!({ "name": "Laptop", "category_id": category_id, "coverage_amount": 90_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_str().unwrap().to_string();

    let (status, item) = app
        .send(Method::POST, &format!("/api/v1/items/{}/submit", item_id), Some(&member_auth), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["coverage_status"], "approved");

    // 成员不能审核
    let (status, _) = app
        .send(Method::POST, &format!("/api/v1/items/{}/approve", item_id), Some(&member_auth), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, claim) = app
        .send(
            Method::POST,
            &format!("/api/v1/policies/{}/claims", policy_id),
            Some(&member_auth),
            Some(json!({ "incident_type": "theft", "incident_description": "Stolen from car" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let claim_id = claim["id"].as_str().unwrap().to_string();
    assert!(claim["reference_number"].as_str().unwrap().starts_with("CLM-"));

    // 没有理赔项不能提交
    let (status, _) = app
        .send(Method::POST, &format!("/api/v1/claims/{}/submit", claim_id), Some(&member_auth), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, claim_item) = app
        .send(
            Method::POST,
            &format!("/api/v1/claims/{}/items", claim_id),
            Some(&member_auth),
            Some(json!({ "item_id": item_id, "payout_option": "replacement", "replace_estimate": 80_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let claim_item_id = claim_item["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/claim-items/{}", claim_item_id),
            Some(&member_auth),
            Some(json!({ "replace_actual": 120_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, claim) = app
        .send(Method::POST, &format!("/api/v1/claims/{}/submit", claim_id), Some(&member_auth), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["status"], "pending");

    for expected in ["review1", "review2", "review3"] {
        let (status, claim) = app
            .send(Method::POST, &format!("/api/v1/claims/{}/approve", claim_id), Some(&steward_auth), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(claim["status"], expected);
    }

    // 终审需要 Signator
    let (status, _) = app
        .send(Method::POST, &format!("/api/v1/claims/{}/approve", claim_id), Some(&steward_auth), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, claim) = app
        .send(Method::POST, &format!("/api/v1/claims/{}/approve", claim_id), Some(&signator_auth), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["status"], "approved");
    // 赔付以保额为上限
    assert_eq!(claim["total_payout"], 90_000);
    assert_eq!(claim["reviewer_id"], signator.id.to_string());
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_unknown_category_rejected() {
    let app = TestApp::new().await;
    let member = common::insert_user(&app.pool, AppRole::User).await;
    let auth = common::bearer(&app.config, &member);

    let (_, policy) = app
        .send(Method::POST, "/api/v1/policies", Some(&auth), Some(json!({ "name": "Rollback household" })))
        .await;
    let policy_id = policy["id"].as_str().unwrap().to_string();

    // 类别不存在
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/policies/{}/items", policy_id),
            Some(&auth),
            Some(json!({ "name": "Bike", "category_id": Uuid::new_v4(), "coverage_amount": 5_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_last_member_cannot_leave() {
    let app = TestApp::new().await;
    let member = common::insert_user(&app.pool, AppRole::User).await;
    let auth = common::bearer(&app.config, &member);

    let (_, policy) = app
        .send(Method::POST, "/api/v1/policies", Some(&auth), Some(json!({ "name": "Solo household" })))
        .await;
    let (_, members) = app
        .send(Method::GET, &format!("/api/v1/policies/{}/members", policy["id"].as_str().unwrap()), Some(&auth), None)
        .await;
    let member_id = members["members"][0]["id"].as_str().unwrap().to_string();

    let (status, json) = app
        .send(Method::DELETE, &format!("/api/v1/policy-members/{}", member_id), Some(&auth), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["key"], "ErrorValidation");
}

// ==================== 路径与兜底 ====================

async fn create_policy(app: &TestApp, auth: &str) -> String {
    let (status, policy) = app
        .send(Method::POST, "/api/v1/policies", Some(auth), Some(json!({ "name": "Household" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    policy["id"].as_str().unwrap().to_string()
}

async fn create_item(app: &TestApp, auth: &str, policy_id: &str, category_id: Uuid) -> String {
    let (status, item) = app
        .send(
            Method::POST,
            &format!("/api/v1/policies/{}/items", policy_id),
            Some(auth),
            Some(json!({ "name": "Camera", "category_id": category_id, "coverage_amount": 90_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    item["id"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_bad_id_segment_is_malformed() {
    let app = TestApp::new().await;
    let member = common::insert_user(&app.pool, AppRole::User).await;
    let admin = common::insert_user(&app.pool, AppRole::Admin).await;
    let member_auth = common::bearer(&app.config, &member);
    let admin_auth = common::bearer(&app.config, &admin);

    for uri in [
        "/api/v1/policies/not-a-uuid".to_string(),
        format!("/api/v1/policies/{}", Uuid::nil()),
    ] {
        let (status, json) = app.send(Method::GET, &uri, Some(&member_auth), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"]["key"], "ErrorMalformedResourceId");
    }

    let (status, json) = app
        .send(Method::PUT, "/api/v1/items/not-a-uuid", Some(&admin_auth), Some(json!({ "name": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["key"], "ErrorMalformedResourceId");

    let (status, _) = app.send(Method::DELETE, "/api/v1/claims/not-a-uuid", Some(&admin_auth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_unknown_sub_resource_is_denied_like_a_foreign_id() {
    let app = TestApp::new().await;
    let owner = common::insert_user(&app.pool, AppRole::User).await;
    let outsider = common::insert_user(&app.pool, AppRole::User).await;
    let category_id = common::insert_category(&app.pool, 100_000).await;
    let owner_auth = common::bearer(&app.config, &owner);
    let outsider_auth = common::bearer(&app.config, &outsider);

    let policy_id = create_policy(&app, &owner_auth).await;
    let item_id = create_item(&app, &owner_auth, &policy_id, category_id).await;

    // 成员对自己的物品使用未知子资源
    let (bogus_status, bogus) = app
        .send(Method::POST, &format!("/api/v1/items/{}/bogus-sub", item_id), Some(&owner_auth), None)
        .await;
    // 非成员访问存在的物品
    let (foreign_status, foreign) = app
        .send(Method::GET, &format!("/api/v1/items/{}", item_id), Some(&outsider_auth), None)
        .await;
    // 不存在的物品
    let (missing_status, missing) = app
        .send(Method::GET, &format!("/api/v1/items/{}/bogus-sub", Uuid::new_v4()), Some(&owner_auth), None)
        .await;

    for (status, body) in [(bogus_status, &bogus), (foreign_status, &foreign), (missing_status, &missing)] {
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["key"], "ErrorNotAuthorized");
        assert_eq!(body["error"]["code"], bogus["error"]["code"]);
        assert_eq!(body["error"]["message"], bogus["error"]["message"]);
    }

    // 未知子资源同样先要求认证
    let (status, json) = app
        .send(Method::POST, &format!("/api/v1/items/{}/bogus-sub", item_id), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["key"], "ErrorNotAuthenticated");

    // 物品状态未被改动
    let (_, item) = app
        .send(Method::GET, &format!("/api/v1/items/{}", item_id), Some(&owner_auth), None)
        .await;
    assert_eq!(item["coverage_status"], "draft");
}

// ==================== 终审结算 ====================

#[tokio::test]
#[ignore]
#[serial]
async fn test_individually_approved_claim_item_is_paid_at_final_approval() {
    let app = TestApp::new().await;
    let member = common::insert_user(&app.pool, AppRole::User).await;
    let steward = common::insert_user(&app.pool, AppRole::Steward).await;
    let signator = common::insert_user(&app.pool, AppRole::Signator).await;
    let category_id = common::insert_category(&app.pool, 100_000).await;

    let member_auth = common::bearer(&app.config, &member);
    let steward_auth = common::bearer(&app.config, &steward);
    let signator_auth = common::bearer(&app.config, &signator);

    let policy_id = create_policy(&app, &member_auth).await;
    let camera_id = create_item(&app, &member_auth, &policy_id, category_id).await;
    let lens_id = create_item(&app, &member_auth, &policy_id, category_id).await;
    for item_id in [&camera_id, &lens_id] {
        let (status, _) = app
            .send(Method::POST, &format!("/api/v1/items/{}/submit", item_id), Some(&member_auth), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, claim) = app
        .send(
            Method::POST,
            &format!("/api/v1/policies/{}/claims", policy_id),
            Some(&member_auth),
            Some(json!({ "incident_type": "theft", "incident_description": "Bag stolen" })),
        )
        .await;
    let claim_id = claim["id"].as_str().unwrap().to_string();

    let mut claim_item_ids = Vec::new();
    for (item_id, actual) in [(&camera_id, 120_000), (&lens_id, 30_000)] {
        let (status, claim_item) = app
            .send(
                Method::POST,
                &format!("/api/v1/claims/{}/items", claim_id),
                Some(&member_auth),
                Some(json!({ "item_id": item_id, "payout_option": "replacement" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let claim_item_id = claim_item["id"].as_str().unwrap().to_string();
        let (status, _) = app
            .send(
                Method::PUT,
                &format!("/api/v1/claim-items/{}", claim_item_id),
                Some(&member_auth),
                Some(json!({ "replace_actual": actual })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        claim_item_ids.push(claim_item_id);
    }

    // 成员不能自行推进理赔项状态
    let (status, json) = app
        .send(
            Method::PUT,
            &format!("/api/v1/claim-items/{}", claim_item_ids[0]),
            Some(&member_auth),
            Some(json!({ "status": "pending" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["key"], "ErrorNotAuthorized");

    app.send(Method::POST, &format!("/api/v1/claims/{}/submit", claim_id), Some(&member_auth), None)
        .await;
    for _ in 0..3 {
        let (status, _) = app
            .send(Method::POST, &format!("/api/v1/claims/{}/approve", claim_id), Some(&steward_auth), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // 审核人先单独批准第一项
    let (status, camera) = app
        .send(
            Method::PUT,
            &format!("/api/v1/claim-items/{}", claim_item_ids[0]),
            Some(&steward_auth),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(camera["status"], "approved");
    assert_eq!(camera["payout_amount"], 0);

    let (status, claim) = app
        .send(Method::POST, &format!("/api/v1/claims/{}/approve", claim_id), Some(&signator_auth), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    // 90_000（按保额封顶）+ 30_000
    assert_eq!(claim["total_payout"], 120_000);

    let (_, detail) = app
        .send(Method::GET, &format!("/api/v1/claims/{}", claim_id), Some(&member_auth), None)
        .await;
    for claim_item in detail["claim_items"].as_array().unwrap() {
        assert_eq!(claim_item["status"], "approved");
        assert!(claim_item["payout_amount"].as_i64().unwrap() > 0);
    }

    let payout: i64 = sqlx::query_scalar(
        "SELECT amount FROM ledger_entries WHERE claim_id = $1 AND entry_type = 'claim_payout'",
    )
    .bind(Uuid::parse_str(&claim_id).unwrap())
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(payout, -120_000);
}

// ==================== 账务报表 ====================

#[tokio::test]
#[ignore]
#[serial]
async fn test_get_report_returns_loaded_report() {
    let app = TestApp::new().await;
    let admin = common::insert_user(&app.pool, AppRole::Admin).await;
    let auth = common::bearer(&app.config, &admin);

    let (_, report) = app
        .send(
            Method::POST,
            "/api/v1/ledger-reports",
            Some(&auth),
            Some(json!({ "period_start": "2024-01-01", "period_end": "2024-06-30" })),
        )
        .await;
    let (status, fetched) = app
        .send(Method::GET, &format!("/api/v1/ledger-reports/{}", report["id"].as_str().unwrap()), Some(&auth), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, report);
}

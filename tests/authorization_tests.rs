//! 授权规则集成测试（不需要数据库）
//!
//! 覆盖路径解析、各资源的判定规则与生命周期门控

use cover_system::{
    authz::{parse_resource_path, Permission, ResourceKind, ResourceRegistry, SubResource},
    error::AppError,
    lifecycle::{
        claim::{claim_action_requirement, claim_action_target, is_claim_transition_valid, Requirement},
        claim_item::is_claim_item_transition_valid,
        item::{is_item_action_allowed, is_item_transition_valid},
    },
    models::{AppRole, Claim, ClaimItem, ClaimItemStatus, ClaimStatus, CoverageStatus, Item, LedgerReport, Policy, Strike, User},
};
use uuid::Uuid;

const PERMISSIONS: [Permission; 6] = [
    Permission::List,
    Permission::View,
    Permission::Create,
    Permission::Update,
    Permission::Delete,
    Permission::Denied,
];

const SUB_RESOURCES: [SubResource; 13] = [
    SubResource::None,
    SubResource::Submit,
    SubResource::Revision,
    SubResource::Approve,
    SubResource::Deny,
    SubResource::Preapprove,
    SubResource::Receipt,
    SubResource::Items,
    SubResource::Claims,
    SubResource::Dependents,
    SubResource::Members,
    SubResource::Strikes,
    SubResource::Unrecognized,
];

fn user(app_role: AppRole) -> User {
    User {
        id: Uuid::new_v4(),
        app_role,
        ..Default::default()
    }
}

// ==================== 路径解析 ====================

#[test]
fn test_registry_resolves_every_kind() {
    let registry = ResourceRegistry::standard();
    assert_eq!(registry.len(), ResourceKind::ALL.len());
    for kind in ResourceKind::ALL {
        assert_eq!(registry.resolve(kind.path_name()), Some(kind));
    }
    assert_eq!(registry.resolve("widgets"), None);
}

#[test]
fn test_item_submit_path() {
    let id = Uuid::new_v4();
    let path = parse_resource_path(&format!("/api/v1/items/{}/submit", id)).unwrap();
    assert_eq!(path.resource, "items");
    assert_eq!(path.id, Some(id));
    assert_eq!(path.sub_resource, SubResource::Submit);
}

#[test]
fn test_malformed_id_with_sub_resource() {
    let err = parse_resource_path("/api/v1/items/not-a-uuid/submit").unwrap_err();
    assert!(matches!(err, AppError::MalformedResourceId(segment) if segment == "not-a-uuid"));
}

#[test]
fn test_unknown_sub_resource_parses_unrecognized() {
    let id = Uuid::new_v4();
    let path = parse_resource_path(&format!("/claims/{}/teleport", id)).unwrap();
    assert_eq!(path.sub_resource, SubResource::Unrecognized);
}

// ==================== 管理员与普通用户 ====================

#[test]
fn test_admin_superset_on_policies() {
    let admin = user(AppRole::Admin);
    let member = user(AppRole::User);
    let policy = Policy {
        id: Uuid::new_v4(),
        ..Default::default()
    };

    for permission in PERMISSIONS {
        for sub in SUB_RESOURCES {
            if policy.allows(&member, true, permission, sub) {
                assert!(
                    policy.allows(&admin, false, permission, sub),
                    "admin denied {permission} {sub} that a member may do"
                );
            }
        }
    }
}

#[test]
fn test_non_member_gets_nothing_on_existing_item() {
    let outsider = user(AppRole::User);
    for status in CoverageStatus::ALL {
        let item = Item {
            id: Uuid::new_v4(),
            policy_id: Uuid::new_v4(),
            coverage_status: status,
            ..Default::default()
        };
        for permission in PERMISSIONS {
            for sub in SUB_RESOURCES {
                assert!(!item.allows(&outsider, false, permission, sub));
            }
        }
    }
}

#[test]
fn test_member_submits_draft_item() {
    let member = user(AppRole::User);
    let item = Item {
        id: Uuid::new_v4(),
        coverage_status: CoverageStatus::Draft,
        ..Default::default()
    };
    assert!(item.allows(&member, true, Permission::Create, SubResource::Submit));
    assert!(!item.allows(&member, true, Permission::Create, SubResource::Approve));
}

#[test]
fn test_unrecognized_sub_resource_always_denied_to_members() {
    let member = user(AppRole::User);
    let claim = Claim {
        id: Uuid::new_v4(),
        status: ClaimStatus::Draft,
        ..Default::default()
    };
    for permission in PERMISSIONS {
        assert!(!claim.allows(&member, true, permission, SubResource::Unrecognized));
    }
}

#[test]
fn test_claim_item_requires_membership() {
    let member = user(AppRole::User);
    let claim_item = ClaimItem {
        id: Uuid::new_v4(),
        ..Default::default()
    };
    assert!(claim_item.allows(&member, true, Permission::Update, SubResource::None));
    assert!(!claim_item.allows(&member, false, Permission::Update, SubResource::None));
    assert!(!claim_item.allows(&member, true, Permission::Update, SubResource::Approve));
    assert!(claim_item.allows(&user(AppRole::Steward), false, Permission::Delete, SubResource::None));
}

#[test]
fn test_strikes_and_reports_are_admin_territory() {
    let member = user(AppRole::User);
    let strike = Strike {
        id: Uuid::new_v4(),
        ..Default::default()
    };
    assert!(strike.allows(&member, true, Permission::View, SubResource::None));
    assert!(!strike.allows(&member, true, Permission::Update, SubResource::None));
    assert!(!strike.allows(&member, true, Permission::Delete, SubResource::None));

    let report = LedgerReport::default();
    assert!(!report.allows(&member));
    assert!(report.allows(&user(AppRole::Admin)));
}

#[test]
fn test_users_edit_only_themselves() {
    let me = user(AppRole::User);
    let other = user(AppRole::User);
    assert!(me.allows(&me, Permission::View, SubResource::None));
    assert!(me.allows(&me, Permission::Update, SubResource::None));
    assert!(!other.allows(&me, Permission::View, SubResource::None));
    assert!(!User::default().allows(&me, Permission::List, SubResource::None));
    assert!(other.allows(&user(AppRole::Admin), Permission::Update, SubResource::None));
}

// ==================== 生命周期门控 ====================

#[test]
fn test_review3_needs_signator() {
    let steward = user(AppRole::Steward);
    let signator = user(AppRole::Signator);
    let requirement =
        claim_action_requirement(ClaimStatus::Review3, Permission::Create, SubResource::Approve).unwrap();
    assert_eq!(requirement, Requirement::Review(cover_system::models::Capability::Signator));
    assert!(!requirement.is_met_by(&steward, false));
    assert!(requirement.is_met_by(&signator, false));
}

#[test]
fn test_item_actions_lead_along_legal_edges() {
    // 门控允许的每个动作都必须对应合法迁移
    let action_targets = [
        (SubResource::Submit, CoverageStatus::Pending),
        (SubResource::Approve, CoverageStatus::Approved),
        (SubResource::Deny, CoverageStatus::Denied),
        (SubResource::Revision, CoverageStatus::Revision),
    ];
    for status in CoverageStatus::ALL {
        for (sub, target) in action_targets {
            if is_item_action_allowed(true, status, Permission::Create, sub) {
                assert!(is_item_transition_valid(status, target), "{status} --{sub}--> {target}");
            }
        }
    }
}

#[test]
fn test_claim_actions_lead_along_legal_edges() {
    for status in ClaimStatus::ALL {
        for sub in SUB_RESOURCES {
            if claim_action_requirement(status, Permission::Create, sub).is_some() && sub != SubResource::Items {
                let target = claim_action_target(status, sub)
                    .unwrap_or_else(|| panic!("gated action {sub} on {status} has no target"));
                assert!(is_claim_transition_valid(status, target));
            }
        }
    }
}

#[test]
fn test_terminal_states_have_no_exits() {
    for to in ClaimStatus::ALL {
        assert!(!is_claim_transition_valid(ClaimStatus::Approved, to));
        assert!(!is_claim_transition_valid(ClaimStatus::Denied, to));
    }
    for to in CoverageStatus::ALL {
        assert!(!is_item_transition_valid(CoverageStatus::Denied, to));
        assert!(!is_item_transition_valid(CoverageStatus::Inactive, to));
    }
    for to in ClaimItemStatus::ALL {
        assert!(!is_claim_item_transition_valid(ClaimItemStatus::Approved, to));
        assert!(!is_claim_item_transition_valid(ClaimItemStatus::Denied, to));
    }
}

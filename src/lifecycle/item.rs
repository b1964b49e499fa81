//! Item coverage lifecycle
//! 物品保障状态表与动作门控

use crate::authz::permission::{Permission, SubResource};
use crate::error::AppError;
use crate::models::item::CoverageStatus;

use super::check_transition;

/// 每个保障状态的合法后继
pub fn item_transition_targets(from: CoverageStatus) -> &'static [CoverageStatus] {
    use CoverageStatus::*;
    match from {
        Draft => &[Pending, Approved],
        Pending => &[Revision, Approved, Denied],
        Revision => &[Pending],
        Approved => &[Inactive],
        Denied | Inactive => &[],
    }
}

pub fn is_item_transition_valid(from: CoverageStatus, to: CoverageStatus) -> bool {
    validate_item_transition(from, to).is_ok()
}

pub fn validate_item_transition(from: CoverageStatus, to: CoverageStatus) -> Result<(), AppError> {
    check_transition("item", from, to, item_transition_targets(from))
}

struct ItemActionRule {
    status: CoverageStatus,
    permission: Permission,
    sub_resource: SubResource,
    admin_only: bool,
}

const fn rule(
    status: CoverageStatus,
    permission: Permission,
    sub_resource: SubResource,
    admin_only: bool,
) -> ItemActionRule {
    ItemActionRule {
        status,
        permission,
        sub_resource,
        admin_only,
    }
}

const ITEM_ACTION_RULES: &[ItemActionRule] = &[
    rule(CoverageStatus::Draft, Permission::Update, SubResource::None, false),
    rule(CoverageStatus::Draft, Permission::Create, SubResource::Submit, false),
    rule(CoverageStatus::Draft, Permission::Delete, SubResource::None, false),
    rule(CoverageStatus::Revision, Permission::Update, SubResource::None, false),
    rule(CoverageStatus::Revision, Permission::Create, SubResource::Submit, false),
    rule(CoverageStatus::Revision, Permission::Delete, SubResource::None, false),
    rule(CoverageStatus::Pending, Permission::Create, SubResource::Revision, true),
    rule(CoverageStatus::Pending, Permission::Create, SubResource::Approve, true),
    rule(CoverageStatus::Pending, Permission::Create, SubResource::Deny, true),
    rule(CoverageStatus::Pending, Permission::Delete, SubResource::None, false),
    rule(CoverageStatus::Approved, Permission::Delete, SubResource::None, false),
];

/// 物品处于 `status` 时能否尝试改变状态的动作；读权限只看成员关系，不在此表中
pub fn is_item_action_allowed(
    actor_is_admin: bool,
    status: CoverageStatus,
    permission: Permission,
    sub_resource: SubResource,
) -> bool {
    ITEM_ACTION_RULES.iter().any(|r| {
        r.status == status
            && r.permission == permission
            && r.sub_resource == sub_resource
            && (actor_is_admin || !r.admin_only)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use CoverageStatus::*;

    const PERMISSIONS: [Permission; 6] = [
        Permission::List,
        Permission::View,
        Permission::Create,
        Permission::Update,
        Permission::Delete,
        Permission::Denied,
    ];

    const SUB_RESOURCES: [SubResource; 8] = [
        SubResource::None,
        SubResource::Submit,
        SubResource::Revision,
        SubResource::Approve,
        SubResource::Deny,
        SubResource::Preapprove,
        SubResource::Receipt,
        SubResource::Unrecognized,
    ];

    #[test]
    fn test_draft_rules() {
        assert!(is_item_action_allowed(false, Draft, Permission::Update, SubResource::None));
        assert!(!is_item_action_allowed(false, Draft, Permission::Create, SubResource::None));
        assert!(is_item_action_allowed(false, Draft, Permission::Create, SubResource::Submit));
        assert!(is_item_action_allowed(false, Draft, Permission::Delete, SubResource::None));
        assert!(!is_item_action_allowed(false, Draft, Permission::Delete, SubResource::Submit));
    }

    #[test]
    fn test_revision_rules() {
        assert!(is_item_action_allowed(false, Revision, Permission::Update, SubResource::None));
        assert!(is_item_action_allowed(false, Revision, Permission::Create, SubResource::Submit));
        assert!(is_item_action_allowed(false, Revision, Permission::Delete, SubResource::None));
        assert!(!is_item_action_allowed(true, Revision, Permission::Create, SubResource::Approve));
        assert!(!is_item_action_allowed(true, Revision, Permission::Create, SubResource::None));
    }

    #[test]
    fn test_pending_review_actions_need_admin() {
        for sub in [SubResource::Revision, SubResource::Approve, SubResource::Deny] {
            assert!(is_item_action_allowed(true, Pending, Permission::Create, sub));
            assert!(!is_item_action_allowed(false, Pending, Permission::Create, sub));
        }
        assert!(!is_item_action_allowed(true, Pending, Permission::Create, SubResource::None));
        assert!(is_item_action_allowed(false, Pending, Permission::Delete, SubResource::None));
        assert!(!is_item_action_allowed(false, Pending, Permission::Update, SubResource::None));
    }

    #[test]
    fn test_approved_is_locked_except_delete() {
        for admin in [false, true] {
            for permission in PERMISSIONS {
                for sub in SUB_RESOURCES {
                    let allowed = is_item_action_allowed(admin, Approved, permission, sub);
                    let expected = permission == Permission::Delete && sub == SubResource::None;
                    assert_eq!(allowed, expected, "{permission} {sub:?} admin={admin}");
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_allow_nothing() {
        for status in [Denied, Inactive] {
            for admin in [false, true] {
                for permission in PERMISSIONS {
                    for sub in SUB_RESOURCES {
                        assert!(!is_item_action_allowed(admin, status, permission, sub));
                    }
                }
            }
        }
    }

    #[test]
    fn test_unlisted_combinations_fail_closed() {
        let listed: usize = ITEM_ACTION_RULES.len();
        let mut allowed_for_admin = 0;
        for status in CoverageStatus::ALL {
            for permission in PERMISSIONS {
                for sub in SUB_RESOURCES {
                    if is_item_action_allowed(true, status, permission, sub) {
                        allowed_for_admin += 1;
                    }
                }
            }
        }
        assert_eq!(allowed_for_admin, listed);
    }

    #[test]
    fn test_transition_table() {
        assert!(is_item_transition_valid(Draft, Pending));
        assert!(is_item_transition_valid(Draft, Approved));
        assert!(is_item_transition_valid(Pending, Revision));
        assert!(is_item_transition_valid(Pending, Denied));
        assert!(is_item_transition_valid(Revision, Pending));
        assert!(is_item_transition_valid(Approved, Inactive));

        assert!(!is_item_transition_valid(Denied, Pending));
        assert!(!is_item_transition_valid(Revision, Approved));
        assert!(!is_item_transition_valid(Approved, Pending));
        assert!(!is_item_transition_valid(Inactive, Approved));
    }

    #[test]
    fn test_same_state_is_always_valid() {
        for status in CoverageStatus::ALL {
            assert!(validate_item_transition(status, status).is_ok());
        }
    }

    #[test]
    fn test_invalid_transition_error_names_states() {
        let err = validate_item_transition(Denied, Pending).unwrap_err();
        assert_eq!(err.user_message(), "Invalid item status transition: denied -> pending");
    }
}

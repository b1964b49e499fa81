//! Claim lifecycle
//! 理赔最多经过三级审核：Review1、Review2 由 Steward 处理，Review3 由 Signator 处理；
//! Draft、Revision、Receipt 状态由成员推进

use crate::authz::permission::{Permission, SubResource};
use crate::error::AppError;
use crate::models::claim::ClaimStatus;
use crate::models::user::{Capability, User};

use super::check_transition;

pub fn claim_transition_targets(from: ClaimStatus) -> &'static [ClaimStatus] {
    use ClaimStatus::*;
    match from {
        Draft => &[Pending],
        Pending => &[Review1, Revision, Denied],
        Review1 => &[Review2, Receipt, Revision, Denied],
        Review2 => &[Review3, Receipt, Revision, Denied],
        Review3 => &[Approved, Revision, Denied],
        Receipt => &[Review2],
        Revision => &[Pending],
        Approved | Denied => &[],
    }
}

pub fn is_claim_transition_valid(from: ClaimStatus, to: ClaimStatus) -> bool {
    validate_claim_transition(from, to).is_ok()
}

pub fn validate_claim_transition(from: ClaimStatus, to: ClaimStatus) -> Result<(), AppError> {
    check_transition("claim", from, to, claim_transition_targets(from))
}

/// 谁可以尝试某个理赔动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// 保单成员（管理员同样满足）
    Member,
    Review(Capability),
}

impl Requirement {
    pub fn is_met_by(&self, actor: &User, is_member: bool) -> bool {
        match self {
            Requirement::Member => is_member || actor.is_admin(),
            Requirement::Review(capability) => actor.app_role.has(*capability),
        }
    }
}

struct ClaimActionRule {
    status: ClaimStatus,
    permission: Permission,
    sub_resource: SubResource,
    requirement: Requirement,
}

const fn rule(
    status: ClaimStatus,
    permission: Permission,
    sub_resource: SubResource,
    requirement: Requirement,
) -> ClaimActionRule {
    ClaimActionRule {
        status,
        permission,
        sub_resource,
        requirement,
    }
}

const MEMBER: Requirement = Requirement::Member;
const STEWARD: Requirement = Requirement::Review(Capability::Steward);
const SIGNATOR: Requirement = Requirement::Review(Capability::Signator);

const CLAIM_ACTION_RULES: &[ClaimActionRule] = &[
    rule(ClaimStatus::Draft, Permission::Update, SubResource::None, MEMBER),
    rule(ClaimStatus::Draft, Permission::Delete, SubResource::None, MEMBER),
    rule(ClaimStatus::Draft, Permission::Create, SubResource::Submit, MEMBER),
    rule(ClaimStatus::Draft, Permission::Create, SubResource::Items, MEMBER),
    rule(ClaimStatus::Revision, Permission::Update, SubResource::None, MEMBER),
    rule(ClaimStatus::Revision, Permission::Create, SubResource::Submit, MEMBER),
    rule(ClaimStatus::Revision, Permission::Create, SubResource::Items, MEMBER),
    rule(ClaimStatus::Receipt, Permission::Update, SubResource::None, MEMBER),
    rule(ClaimStatus::Receipt, Permission::Create, SubResource::Submit, MEMBER),
    rule(ClaimStatus::Pending, Permission::Create, SubResource::Approve, STEWARD),
    rule(ClaimStatus::Pending, Permission::Create, SubResource::Revision, STEWARD),
    rule(ClaimStatus::Pending, Permission::Create, SubResource::Deny, STEWARD),
    rule(ClaimStatus::Review1, Permission::Create, SubResource::Approve, STEWARD),
    rule(ClaimStatus::Review1, Permission::Create, SubResource::Preapprove, STEWARD),
    rule(ClaimStatus::Review1, Permission::Create, SubResource::Revision, STEWARD),
    rule(ClaimStatus::Review1, Permission::Create, SubResource::Deny, STEWARD),
    rule(ClaimStatus::Review2, Permission::Create, SubResource::Approve, STEWARD),
    rule(ClaimStatus::Review2, Permission::Create, SubResource::Receipt, STEWARD),
    rule(ClaimStatus::Review2, Permission::Create, SubResource::Revision, STEWARD),
    rule(ClaimStatus::Review2, Permission::Create, SubResource::Deny, STEWARD),
    rule(ClaimStatus::Review3, Permission::Create, SubResource::Approve, SIGNATOR),
    rule(ClaimStatus::Review3, Permission::Create, SubResource::Revision, SIGNATOR),
    rule(ClaimStatus::Review3, Permission::Create, SubResource::Deny, SIGNATOR),
];

/// 尝试改变状态的理赔动作所需的资格，任何人都不允许时为 `None`
pub fn claim_action_requirement(
    status: ClaimStatus,
    permission: Permission,
    sub_resource: SubResource,
) -> Option<Requirement> {
    CLAIM_ACTION_RULES
        .iter()
        .find(|r| r.status == status && r.permission == permission && r.sub_resource == sub_resource)
        .map(|r| r.requirement)
}

/// 理赔子动作的目标状态
pub fn claim_action_target(status: ClaimStatus, sub_resource: SubResource) -> Option<ClaimStatus> {
    use ClaimStatus::*;
    let target = match (status, sub_resource) {
        (Draft | Revision, SubResource::Submit) => Pending,
        (Receipt, SubResource::Submit) => Review2,
        (Pending, SubResource::Approve) => Review1,
        (Review1, SubResource::Approve) => Review2,
        (Review2, SubResource::Approve) => Review3,
        (Review3, SubResource::Approve) => Approved,
        (Review1, SubResource::Preapprove) => Receipt,
        (Review2, SubResource::Receipt) => Receipt,
        (Pending | Review1 | Review2 | Review3, SubResource::Revision) => Revision,
        (Pending | Review1 | Review2 | Review3, SubResource::Deny) => Denied,
        _ => return None,
    };
    Some(target)
}

/// 子动作必须在 `status` 下有门控规则，并沿合法边迁移
pub fn plan_claim_action(status: ClaimStatus, sub_resource: SubResource) -> Result<ClaimStatus, AppError> {
    let target = claim_action_target(status, sub_resource).ok_or_else(|| {
        AppError::validation(&format!(
            "claim action '{}' is not available while the claim is {}",
            sub_resource, status
        ))
    })?;
    validate_claim_transition(status, target)?;
    Ok(target)
}

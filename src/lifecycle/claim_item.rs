//! Claim item lifecycle
//! 理赔项状态表；除通用边外，理赔提交需要 Draft -> Pending

use crate::error::AppError;
use crate::models::claim_item::ClaimItemStatus;

use super::check_transition;

pub fn claim_item_transition_targets(from: ClaimItemStatus) -> &'static [ClaimItemStatus] {
    use ClaimItemStatus::*;
    match from {
        // 随理赔提交进入待审
        Draft => &[Pending],
        Pending => &[Revision, Approved, Denied],
        Revision => &[Pending],
        Approved | Denied => &[],
    }
}

pub fn is_claim_item_transition_valid(from: ClaimItemStatus, to: ClaimItemStatus) -> bool {
    validate_claim_item_transition(from, to).is_ok()
}

pub fn validate_claim_item_transition(
    from: ClaimItemStatus,
    to: ClaimItemStatus,
) -> Result<(), AppError> {
    check_transition("claim item", from, to, claim_item_transition_targets(from))
}

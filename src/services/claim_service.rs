//! Claim service
//! 理赔的创建、编辑、提交与多级审核，以及理赔项的联动

use chrono::Utc;
use sqlx::PgConnection;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::authz::permission::SubResource;
use crate::error::{AppError, Result};
use crate::events::{DomainEvent, EventKind, EventQueue};
use crate::lifecycle::claim::plan_claim_action;
use crate::lifecycle::claim_item::validate_claim_item_transition;
use crate::models::claim::*;
use crate::models::claim_item::*;
use crate::models::item::CoverageStatus;
use crate::models::ledger::{LedgerEntryType, NewLedgerEntry};
use crate::models::user::User;
use crate::repository::{
    ClaimItemRepository, ClaimRepository, ClaimStatusChange, ItemRepository, LedgerRepository,
};

/// 生成理赔编号：CLM-YYYYMMDD-XXXXXXXX
pub fn generate_reference_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("CLM-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

/// 需要填写说明的动作
pub fn action_requires_reason(sub_resource: SubResource) -> bool {
    matches!(
        sub_resource,
        SubResource::Revision | SubResource::Receipt | SubResource::Deny
    )
}

/// 动作对应的事件类型
pub fn action_event_kind(sub_resource: SubResource, target: ClaimStatus) -> EventKind {
    match (sub_resource, target) {
        (SubResource::Submit, _) => EventKind::ClaimSubmitted,
        (SubResource::Preapprove, _) => EventKind::ClaimPreapproved,
        (SubResource::Receipt, _) => EventKind::ClaimReceiptRequested,
        (SubResource::Revision, _) => EventKind::ClaimRevision,
        (SubResource::Deny, _) => EventKind::ClaimDenied,
        (_, ClaimStatus::Approved) => EventKind::ClaimApproved,
        _ => EventKind::ClaimReviewAdvanced,
    }
}

/// 理赔项跟随理赔动作要进入的状态，不需要联动时为 `None`
fn claim_item_follow_up(from: ClaimItemStatus, target: ClaimStatus) -> Option<ClaimItemStatus> {
    match (target, from) {
        (ClaimStatus::Pending, ClaimItemStatus::Draft | ClaimItemStatus::Revision) => {
            Some(ClaimItemStatus::Pending)
        }
        (ClaimStatus::Revision, ClaimItemStatus::Pending) => Some(ClaimItemStatus::Revision),
        (ClaimStatus::Denied, ClaimItemStatus::Pending) => Some(ClaimItemStatus::Denied),
        (ClaimStatus::Approved, ClaimItemStatus::Pending) => Some(ClaimItemStatus::Approved),
        _ => None,
    }
}

/// 终审时的赔付额：待审或已被单独批准的理赔项都要结算，其余为 `None`
fn settlement_payout(claim_item: &ClaimItem, coverage_amount: i64) -> Option<i64> {
    matches!(claim_item.status, ClaimItemStatus::Pending | ClaimItemStatus::Approved)
        .then(|| claim_item.compute_payout(coverage_amount))
}

/// 成员只能编辑金额字段，理赔项状态由理赔动作和审核人推进
fn check_member_status_change(
    current: ClaimItemStatus,
    requested: Option<ClaimItemStatus>,
) -> Result<()> {
    match requested {
        Some(next) if next != current => Err(AppError::not_authorized(&format!(
            "members cannot move a claim item from {} to {}",
            current, next
        ))),
        _ => Ok(()),
    }
}

/// 理赔服务
#[derive(Default)]
pub struct ClaimService;

impl ClaimService {
    pub fn new() -> Self {
        Self
    }

    /// 在保单下新建草稿理赔
    #[instrument(skip(self, conn, req))]
    pub async fn create(&self, conn: &mut PgConnection, policy_id: Uuid, req: &CreateClaimRequest) -> Result<Claim> {
        req.validate()?;
        let reference_number = generate_reference_number();
        let claim = ClaimRepository::create(conn, policy_id, &reference_number, req).await?;
        info!(claim_id = %claim.id, reference_number = %claim.reference_number, "Claim created");
        Ok(claim)
    }

    /// 编辑事故信息
    #[instrument(skip(self, conn, claim, req), fields(claim_id = %claim.id))]
    pub async fn update(&self, conn: &mut PgConnection, claim: &Claim, req: &UpdateClaimRequest) -> Result<Claim> {
        req.validate()?;
        if !claim.status.is_editable_by_member() {
            return Err(AppError::validation(&format!(
                "claim can no longer be edited while {}",
                claim.status
            )));
        }
        ClaimRepository::update(conn, claim.id, claim.status, req).await
    }

    /// 删除草稿理赔
    #[instrument(skip(self, conn, claim), fields(claim_id = %claim.id))]
    pub async fn delete(&self, conn: &mut PgConnection, claim: &Claim) -> Result<()> {
        if claim.status != ClaimStatus::Draft {
            return Err(AppError::validation("only draft claims can be deleted"));
        }
        ClaimRepository::delete(conn, claim.id, claim.status).await?;
        info!("Claim deleted");
        Ok(())
    }

    /// 向理赔添加理赔项
    #[instrument(skip(self, conn, claim, req), fields(claim_id = %claim.id, item_id = %req.item_id))]
    pub async fn add_item(
        &self,
        conn: &mut PgConnection,
        claim: &Claim,
        req: &CreateClaimItemRequest,
    ) -> Result<ClaimItem> {
        req.validate()?;
        if !matches!(claim.status, ClaimStatus::Draft | ClaimStatus::Revision) {
            return Err(AppError::validation(&format!(
                "items cannot be added while the claim is {}",
                claim.status
            )));
        }

        let item = ItemRepository::find_by_id(conn, req.item_id)
            .await?
            .ok_or_else(|| AppError::validation("unknown item"))?;
        if item.policy_id != claim.policy_id {
            return Err(AppError::validation("item belongs to a different policy"));
        }
        if item.coverage_status != CoverageStatus::Approved {
            return Err(AppError::validation("only items with approved coverage can be claimed"));
        }
        if ClaimItemRepository::exists_for_item(conn, claim.id, item.id).await? {
            return Err(AppError::conflict("item is already part of this claim"));
        }

        ClaimItemRepository::create(conn, claim.id, req).await
    }

    /// 执行理赔动作（提交、审核推进、预批准、补充票据、退回、拒绝）
    #[instrument(skip(self, conn, events, actor, claim, reason), fields(claim_id = %claim.id, action = %sub_resource))]
    pub async fn act(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        claim: &Claim,
        sub_resource: SubResource,
        reason: Option<&str>,
    ) -> Result<Claim> {
        let target = plan_claim_action(claim.status, sub_resource)?;

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if action_requires_reason(sub_resource) && reason.is_none() {
            return Err(AppError::validation("a reason is required"));
        }

        let claim_items = ClaimItemRepository::list_by_claim(conn, claim.id).await?;
        if sub_resource == SubResource::Submit
            && !claim_items.iter().any(|ci| ci.status.is_submittable())
        {
            return Err(AppError::validation("a claim needs at least one item before it can be submitted"));
        }

        let mut total_payout = None;
        if target == ClaimStatus::Approved {
            let mut total = 0i64;
            for claim_item in &claim_items {
                let item = ItemRepository::find_by_id(conn, claim_item.item_id).await?.ok_or_else(|| {
                    AppError::internal_error(&format!("claim item {} references a missing item", claim_item.id))
                })?;
                let Some(payout) = settlement_payout(claim_item, item.coverage_amount) else {
                    continue;
                };
                ClaimItemRepository::update_status(
                    conn,
                    claim_item.id,
                    claim_item.status,
                    ClaimItemStatus::Approved,
                    Some(payout),
                )
                .await?;
                total += payout;
            }
            total_payout = Some(total);
        } else {
            for claim_item in &claim_items {
                if let Some(next) = claim_item_follow_up(claim_item.status, target) {
                    validate_claim_item_transition(claim_item.status, next)?;
                    ClaimItemRepository::update_status(conn, claim_item.id, claim_item.status, next, None).await?;
                }
            }
        }

        let reviewer_id = (sub_resource != SubResource::Submit).then_some(actor.id);
        let change = ClaimStatusChange {
            from: claim.status,
            to: target,
            reason: if action_requires_reason(sub_resource) {
                reason.map(str::to_string)
            } else {
                None
            },
            reviewer_id,
            total_payout,
        };
        let updated = ClaimRepository::update_status(conn, claim.id, &change).await?;

        if let Some(total) = total_payout {
            if total > 0 {
                LedgerRepository::insert(
                    conn,
                    &NewLedgerEntry {
                        policy_id: claim.policy_id,
                        item_id: None,
                        claim_id: Some(claim.id),
                        entry_type: LedgerEntryType::ClaimPayout,
                        amount: -total,
                        entry_date: Utc::now().date_naive(),
                    },
                )
                .await?;
            }
            info!(total_payout = total, "Claim approved");
        }

        let mut event = DomainEvent::new(claim.id, action_event_kind(sub_resource, target), actor.id);
        if let Some(reason) = change.reason {
            event = event.with_reason(reason);
        }
        events.push(event);

        info!(from = %claim.status, to = %target, "Claim status changed");
        Ok(updated)
    }

    /// 更新理赔项
    #[instrument(skip(self, conn, actor, claim_item, req), fields(claim_item_id = %claim_item.id))]
    pub async fn update_claim_item(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        claim_item: &ClaimItem,
        req: &UpdateClaimItemRequest,
    ) -> Result<ClaimItem> {
        req.validate()?;
        let claim = ClaimRepository::find_by_id(conn, claim_item.claim_id)
            .await?
            .ok_or_else(|| {
                AppError::internal_error(&format!("claim item {} has no claim", claim_item.id))
            })?;

        let admin = actor.is_admin();
        if !admin {
            if !claim.status.is_editable_by_member() {
                warn!(claim_status = %claim.status, "Claim item edit rejected");
                return Err(AppError::validation(&format!(
                    "claim items cannot be edited while the claim is {}",
                    claim.status
                )));
            }
            check_member_status_change(claim_item.status, req.status)?;
        }

        let status = match req.status {
            Some(next) if next != claim_item.status => {
                validate_claim_item_transition(claim_item.status, next)?;
                next
            }
            _ => claim_item.status,
        };
        let reviewer_id = (admin && status != claim_item.status).then_some(actor.id);

        ClaimItemRepository::update(conn, claim_item.id, claim_item.status, status, req, reviewer_id).await
    }

    /// 删除理赔项
    #[instrument(skip(self, conn, claim_item), fields(claim_item_id = %claim_item.id))]
    pub async fn delete_claim_item(&self, conn: &mut PgConnection, claim_item: &ClaimItem) -> Result<()> {
        let claim = ClaimRepository::find_by_id(conn, claim_item.claim_id)
            .await?
            .ok_or_else(|| {
                AppError::internal_error(&format!("claim item {} has no claim", claim_item.id))
            })?;
        if !matches!(claim.status, ClaimStatus::Draft | ClaimStatus::Revision) {
            return Err(AppError::validation(&format!(
                "claim items cannot be removed while the claim is {}",
                claim.status
            )));
        }

        if !ClaimItemRepository::delete(conn, claim_item.id).await? {
            return Err(AppError::not_found("claim item"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_number_format() {
        let reference = generate_reference_number();
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CLM");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_reasons_required() {
        assert!(action_requires_reason(SubResource::Revision));
        assert!(action_requires_reason(SubResource::Receipt));
        assert!(action_requires_reason(SubResource::Deny));
        assert!(!action_requires_reason(SubResource::Approve));
        assert!(!action_requires_reason(SubResource::Submit));
        assert!(!action_requires_reason(SubResource::Preapprove));
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(action_event_kind(SubResource::Submit, ClaimStatus::Pending), EventKind::ClaimSubmitted);
        assert_eq!(action_event_kind(SubResource::Submit, ClaimStatus::Review2), EventKind::ClaimSubmitted);
        assert_eq!(action_event_kind(SubResource::Approve, ClaimStatus::Review1), EventKind::ClaimReviewAdvanced);
        assert_eq!(action_event_kind(SubResource::Approve, ClaimStatus::Approved), EventKind::ClaimApproved);
        assert_eq!(action_event_kind(SubResource::Preapprove, ClaimStatus::Receipt), EventKind::ClaimPreapproved);
        assert_eq!(action_event_kind(SubResource::Receipt, ClaimStatus::Receipt), EventKind::ClaimReceiptRequested);
        assert_eq!(action_event_kind(SubResource::Deny, ClaimStatus::Denied), EventKind::ClaimDenied);
    }

    #[test]
    fn test_claim_items_follow_the_claim() {
        use ClaimItemStatus as S;
        assert_eq!(claim_item_follow_up(S::Draft, ClaimStatus::Pending), Some(S::Pending));
        assert_eq!(claim_item_follow_up(S::Revision, ClaimStatus::Pending), Some(S::Pending));
        assert_eq!(claim_item_follow_up(S::Pending, ClaimStatus::Pending), None);
        assert_eq!(claim_item_follow_up(S::Pending, ClaimStatus::Revision), Some(S::Revision));
        assert_eq!(claim_item_follow_up(S::Pending, ClaimStatus::Denied), Some(S::Denied));
        assert_eq!(claim_item_follow_up(S::Approved, ClaimStatus::Denied), None);
        // 审核推进不改变理赔项
        assert_eq!(claim_item_follow_up(S::Pending, ClaimStatus::Review2), None);
    }

    fn claim_item(status: ClaimItemStatus) -> ClaimItem {
        ClaimItem {
            status,
            payout_option: Some(PayoutOption::Replacement),
            replace_actual: 120_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_settlement_includes_individually_approved_items() {
        // 单独批准时未写入赔付，终审仍要按保额上限结算
        let approved = claim_item(ClaimItemStatus::Approved);
        assert_eq!(approved.payout_amount, 0);
        assert_eq!(settlement_payout(&approved, 90_000), Some(90_000));
        assert_eq!(settlement_payout(&claim_item(ClaimItemStatus::Pending), 150_000), Some(120_000));
    }

    #[test]
    fn test_settlement_skips_undecided_and_denied_items() {
        for status in [ClaimItemStatus::Draft, ClaimItemStatus::Revision, ClaimItemStatus::Denied] {
            assert_eq!(settlement_payout(&claim_item(status), 90_000), None, "{status}");
        }
    }

    #[test]
    fn test_members_cannot_move_claim_item_status() {
        use ClaimItemStatus as S;
        assert!(check_member_status_change(S::Draft, None).is_ok());
        assert!(check_member_status_change(S::Draft, Some(S::Draft)).is_ok());
        for (from, to) in [
            (S::Draft, S::Pending),
            (S::Pending, S::Revision),
            (S::Pending, S::Approved),
            (S::Pending, S::Denied),
        ] {
            let err = check_member_status_change(from, Some(to)).unwrap_err();
            assert!(matches!(err, AppError::NotAuthorized(_)), "{from} -> {to}");
        }
    }

    #[test]
    fn test_follow_up_targets_are_legal() {
        for from in ClaimItemStatus::ALL {
            for target in ClaimStatus::ALL {
                if let Some(next) = claim_item_follow_up(from, target) {
                    assert!(validate_claim_item_transition(from, next).is_ok(), "{from} -> {next}");
                }
            }
        }
    }
}

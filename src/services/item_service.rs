//! Item coverage service
//! 物品提交、审核、删除/停保，以及随之产生的账务与通知

use chrono::{DateTime, Duration, Utc};
use sqlx::PgConnection;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::CoverageConfig;
use crate::error::{AppError, Result};
use crate::events::{DomainEvent, EventKind, EventQueue};
use crate::lifecycle::item::validate_item_transition;
use crate::models::item::*;
use crate::models::ledger::{LedgerEntryType, NewLedgerEntry};
use crate::models::user::User;
use crate::repository::{
    ItemRepository, ItemStatusChange, LedgerRepository, PolicyDependentRepository,
};

use super::premium;

/// 删除请求的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPlan {
    HardDelete,
    Inactivate,
}

/// 删除结果
#[derive(Debug, Clone)]
pub enum ItemRemoval {
    Deleted(Uuid),
    Inactivated(Item),
}

/// 决定删除还是停保
///
/// 未生效的物品只要没有理赔项就直接删除；已批准的物品在宽限期内、
/// 没有理赔项且流水未对账时也可删除，否则停保。
pub fn plan_removal(
    item: &Item,
    claim_item_count: i64,
    has_reconciled_entries: bool,
    now: DateTime<Utc>,
    grace_hours: i64,
) -> Result<RemovalPlan> {
    match item.coverage_status {
        CoverageStatus::Draft | CoverageStatus::Pending | CoverageStatus::Revision => {
            if claim_item_count == 0 {
                Ok(RemovalPlan::HardDelete)
            } else {
                Err(AppError::validation("item is referenced by a claim and cannot be removed"))
            }
        }
        CoverageStatus::Approved => {
            let within_grace = item
                .approved_at
                .map(|approved| now - approved <= Duration::hours(grace_hours))
                .unwrap_or(false);
            if within_grace && claim_item_count == 0 && !has_reconciled_entries {
                Ok(RemovalPlan::HardDelete)
            } else {
                Ok(RemovalPlan::Inactivate)
            }
        }
        CoverageStatus::Denied | CoverageStatus::Inactive => Err(AppError::invalid_transition(
            "item",
            item.coverage_status,
            CoverageStatus::Inactive,
        )),
    }
}

/// 是否满足自动批准条件（仅草稿首次提交）
pub fn qualifies_for_auto_approve(item: &Item, category: &ItemCategory) -> bool {
    item.coverage_status == CoverageStatus::Draft && item.coverage_amount < category.auto_approve_max
}

/// 物品服务
pub struct ItemService {
    coverage: CoverageConfig,
}

impl ItemService {
    pub fn new(coverage: CoverageConfig) -> Self {
        Self { coverage }
    }

    async fn active_category(conn: &mut PgConnection, category_id: Uuid) -> Result<ItemCategory> {
        let category = ItemRepository::find_category(conn, category_id)
            .await?
            .ok_or_else(|| AppError::validation("unknown item category"))?;
        if !category.is_active {
            return Err(AppError::validation("item category is no longer offered"));
        }
        Ok(category)
    }

    async fn check_dependent(conn: &mut PgConnection, policy_id: Uuid, dependent_id: Option<Uuid>) -> Result<()> {
        if let Some(dependent_id) = dependent_id {
            let dependent = PolicyDependentRepository::find_by_id(conn, dependent_id).await?;
            if dependent.map(|d| d.policy_id) != Some(policy_id) {
                return Err(AppError::validation("dependent does not belong to this policy"));
            }
        }
        Ok(())
    }

    /// 新建草稿物品
    #[instrument(skip(self, conn, req))]
    pub async fn create(&self, conn: &mut PgConnection, policy_id: Uuid, req: &CreateItemRequest) -> Result<Item> {
        req.validate()?;
        Self::active_category(conn, req.category_id).await?;
        Self::check_dependent(conn, policy_id, req.policy_dependent_id).await?;

        let item = ItemRepository::create(conn, policy_id, req).await?;
        info!(item_id = %item.id, "Item created");
        Ok(item)
    }

    /// 编辑草稿或退回修改中的物品
    #[instrument(skip(self, conn, item, req), fields(item_id = %item.id))]
    pub async fn update(&self, conn: &mut PgConnection, item: &Item, req: &UpdateItemRequest) -> Result<Item> {
        req.validate()?;
        if !matches!(item.coverage_status, CoverageStatus::Draft | CoverageStatus::Revision) {
            return Err(AppError::validation(&format!(
                "item can no longer be edited while {}",
                item.coverage_status
            )));
        }
        if let Some(category_id) = req.category_id {
            Self::active_category(conn, category_id).await?;
        }
        Self::check_dependent(conn, item.policy_id, req.policy_dependent_id).await?;

        ItemRepository::update(conn, item.id, item.coverage_status, req).await
    }

    /// 提交审核；草稿且保额低于类别阈值时直接批准
    #[instrument(skip(self, conn, events, actor, item), fields(item_id = %item.id))]
    pub async fn submit(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        item: &Item,
    ) -> Result<Item> {
        let category = ItemRepository::find_category(conn, item.category_id)
            .await?
            .ok_or_else(|| AppError::internal_error(&format!("item {} has no category", item.id)))?;

        if qualifies_for_auto_approve(item, &category) {
            let approved = self.approve_into(conn, item, CoverageStatus::Approved).await?;
            events.push(DomainEvent::new(item.id, EventKind::ItemAutoApproved, actor.id));
            info!(coverage_amount = item.coverage_amount, "Item auto-approved");
            return Ok(approved);
        }

        validate_item_transition(item.coverage_status, CoverageStatus::Pending)?;
        let change = ItemStatusChange::new(item.coverage_status, CoverageStatus::Pending);
        let submitted = ItemRepository::update_status(conn, item.id, &change).await?;
        events.push(DomainEvent::new(item.id, EventKind::ItemSubmitted, actor.id));
        Ok(submitted)
    }

    /// 审核通过
    #[instrument(skip(self, conn, events, actor, item), fields(item_id = %item.id))]
    pub async fn approve(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        item: &Item,
    ) -> Result<Item> {
        if item.coverage_status != CoverageStatus::Pending {
            return Err(AppError::invalid_transition("item", item.coverage_status, CoverageStatus::Approved));
        }
        let approved = self.approve_into(conn, item, CoverageStatus::Approved).await?;
        events.push(DomainEvent::new(item.id, EventKind::ItemApproved, actor.id));
        Ok(approved)
    }

    async fn approve_into(&self, conn: &mut PgConnection, item: &Item, to: CoverageStatus) -> Result<Item> {
        validate_item_transition(item.coverage_status, to)?;

        let today = Utc::now().date_naive();
        let change = ItemStatusChange {
            paid_through_date: Some(premium::end_of_month(today)),
            mark_approved: true,
            ..ItemStatusChange::new(item.coverage_status, to)
        };
        let approved = ItemRepository::update_status(conn, item.id, &change).await?;

        let amount = premium::prorated_premium(item.coverage_amount, self.coverage.premium_factor, today);
        LedgerRepository::insert(
            conn,
            &NewLedgerEntry {
                policy_id: item.policy_id,
                item_id: Some(item.id),
                claim_id: None,
                entry_type: LedgerEntryType::NewCoverage,
                amount,
                entry_date: today,
            },
        )
        .await?;

        info!(premium = amount, "Coverage premium recorded");
        Ok(approved)
    }

    /// 拒绝
    #[instrument(skip(self, conn, events, actor, item, reason), fields(item_id = %item.id))]
    pub async fn deny(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        item: &Item,
        reason: &str,
    ) -> Result<Item> {
        self.review_with_reason(conn, events, actor, item, CoverageStatus::Denied, EventKind::ItemDenied, reason)
            .await
    }

    /// 退回修改
    #[instrument(skip(self, conn, events, actor, item, reason), fields(item_id = %item.id))]
    pub async fn request_revision(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        item: &Item,
        reason: &str,
    ) -> Result<Item> {
        self.review_with_reason(conn, events, actor, item, CoverageStatus::Revision, EventKind::ItemRevision, reason)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn review_with_reason(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        item: &Item,
        to: CoverageStatus,
        kind: EventKind,
        reason: &str,
    ) -> Result<Item> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("a reason is required"));
        }
        if item.coverage_status != CoverageStatus::Pending {
            return Err(AppError::invalid_transition("item", item.coverage_status, to));
        }
        validate_item_transition(item.coverage_status, to)?;

        let change = ItemStatusChange {
            reason: Some(reason.to_string()),
            ..ItemStatusChange::new(item.coverage_status, to)
        };
        let updated = ItemRepository::update_status(conn, item.id, &change).await?;
        events.push(DomainEvent::new(item.id, kind, actor.id).with_reason(reason));
        Ok(updated)
    }

    /// 删除或停保
    #[instrument(skip(self, conn, events, actor, item), fields(item_id = %item.id))]
    pub async fn remove(
        &self,
        conn: &mut PgConnection,
        events: &EventQueue,
        actor: &User,
        item: &Item,
    ) -> Result<ItemRemoval> {
        let claim_items = ItemRepository::count_claim_items(conn, item.id).await?;
        let reconciled = LedgerRepository::has_reconciled_for_item(conn, item.id).await?;
        let now = Utc::now();

        match plan_removal(item, claim_items, reconciled, now, self.coverage.item_delete_grace_hours)? {
            RemovalPlan::HardDelete => {
                let dropped = LedgerRepository::delete_unreconciled_for_item(conn, item.id).await?;
                ItemRepository::delete(conn, item.id, item.coverage_status).await?;
                events.push(DomainEvent::new(item.id, EventKind::ItemDeleted, actor.id));
                info!(ledger_entries_dropped = dropped, "Item deleted");
                Ok(ItemRemoval::Deleted(item.id))
            }
            RemovalPlan::Inactivate => {
                validate_item_transition(item.coverage_status, CoverageStatus::Inactive)?;
                let change = ItemStatusChange::new(item.coverage_status, CoverageStatus::Inactive);
                let inactive = ItemRepository::update_status(conn, item.id, &change).await?;

                let today = now.date_naive();
                let refund = premium::refund_amount(item.coverage_amount, self.coverage.premium_factor, today);
                if refund > 0 {
                    LedgerRepository::insert(
                        conn,
                        &NewLedgerEntry {
                            policy_id: item.policy_id,
                            item_id: Some(item.id),
                            claim_id: None,
                            entry_type: LedgerEntryType::CoverageRefund,
                            amount: -refund,
                            entry_date: today,
                        },
                    )
                    .await?;
                }

                events.push(DomainEvent::new(item.id, EventKind::ItemInactivated, actor.id));
                info!(refund, "Item inactivated");
                Ok(ItemRemoval::Inactivated(inactive))
            }
        }
    }
}

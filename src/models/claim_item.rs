//! Claim item domain models
//! 理赔项及其赔付计算

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Claim item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "claim_item_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimItemStatus {
    #[default]
    Draft,
    Pending,
    Revision,
    Approved,
    Denied,
}

impl ClaimItemStatus {
    pub const ALL: [ClaimItemStatus; 5] = [
        ClaimItemStatus::Draft,
        ClaimItemStatus::Pending,
        ClaimItemStatus::Revision,
        ClaimItemStatus::Approved,
        ClaimItemStatus::Denied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimItemStatus::Draft => "draft",
            ClaimItemStatus::Pending => "pending",
            ClaimItemStatus::Revision => "revision",
            ClaimItemStatus::Approved => "approved",
            ClaimItemStatus::Denied => "denied",
        }
    }

    /// 理赔提交时理赔项可处的状态
    pub fn is_submittable(&self) -> bool {
        matches!(
            self,
            ClaimItemStatus::Draft | ClaimItemStatus::Pending | ClaimItemStatus::Revision
        )
    }
}

impl fmt::Display for ClaimItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_option", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutOption {
    Repair,
    Replacement,
    FairMarketValue,
}

/// Claim item (one covered item inside a claim)
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClaimItem {
    pub id: Uuid,
    pub claim_id: Uuid,
    pub item_id: Uuid,
    pub status: ClaimItemStatus,
    pub is_repairable: Option<bool>,
    // 金额单位均为分
    pub repair_estimate: i64,
    pub repair_actual: i64,
    pub replace_estimate: i64,
    pub replace_actual: i64,
    pub payout_option: Option<PayoutOption>,
    pub fmv: i64,
    pub payout_amount: i64,
    pub review_date: Option<DateTime<Utc>>,
    pub reviewer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimItem {
    /// 按所选赔付方式计算，以物品保额为上限
    pub fn compute_payout(&self, coverage_amount: i64) -> i64 {
        let requested = match self.payout_option {
            Some(PayoutOption::Repair) => self.repair_actual,
            Some(PayoutOption::Replacement) => self.replace_actual,
            Some(PayoutOption::FairMarketValue) => self.fmv,
            None => 0,
        };
        requested.clamp(0, coverage_amount.max(0))
    }
}

/// Add claim item request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimItemRequest {
    pub item_id: Uuid,
    pub is_repairable: Option<bool>,
    #[validate(range(min = 0))]
    pub repair_estimate: Option<i64>,
    #[validate(range(min = 0))]
    pub replace_estimate: Option<i64>,
    pub payout_option: Option<PayoutOption>,
    #[validate(range(min = 0))]
    pub fmv: Option<i64>,
}

/// Update claim item request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClaimItemRequest {
    pub is_repairable: Option<bool>,
    #[validate(range(min = 0))]
    pub repair_estimate: Option<i64>,
    #[validate(range(min = 0))]
    pub repair_actual: Option<i64>,
    #[validate(range(min = 0))]
    pub replace_estimate: Option<i64>,
    #[validate(range(min = 0))]
    pub replace_actual: Option<i64>,
    pub payout_option: Option<PayoutOption>,
    #[validate(range(min = 0))]
    pub fmv: Option<i64>,
    pub status: Option<ClaimItemStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_payout_uses_chosen_option() {
        let claim_item = ClaimItem {
            repair_actual: 5_000,
            replace_actual: 20_000,
            fmv: 12_000,
            payout_option: Some(PayoutOption::Repair),
            ..Default::default()
        };
        assert_eq!(claim_item.compute_payout(100_000), 5_000);

        let claim_item = ClaimItem {
            payout_option: Some(PayoutOption::FairMarketValue),
            ..claim_item
        };
        assert_eq!(claim_item.compute_payout(100_000), 12_000);
    }

    #[test]
    fn test_compute_payout_capped_at_coverage() {
        let claim_item = ClaimItem {
            replace_actual: 90_000,
            payout_option: Some(PayoutOption::Replacement),
            ..Default::default()
        };
        assert_eq!(claim_item.compute_payout(50_000), 50_000);
    }

    #[test]
    fn test_compute_payout_without_option_is_zero() {
        let claim_item = ClaimItem {
            repair_actual: 5_000,
            ..Default::default()
        };
        assert_eq!(claim_item.compute_payout(100_000), 0);
    }
}

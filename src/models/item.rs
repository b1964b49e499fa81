//! Item domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Coverage status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "coverage_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    #[default]
    Draft,
    Pending,
    Revision,
    Approved,
    Denied,
    Inactive,
}

impl CoverageStatus {
    pub const ALL: [CoverageStatus; 6] = [
        CoverageStatus::Draft,
        CoverageStatus::Pending,
        CoverageStatus::Revision,
        CoverageStatus::Approved,
        CoverageStatus::Denied,
        CoverageStatus::Inactive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Draft => "draft",
            CoverageStatus::Pending => "pending",
            CoverageStatus::Revision => "revision",
            CoverageStatus::Approved => "approved",
            CoverageStatus::Denied => "denied",
            CoverageStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item category
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemCategory {
    pub id: Uuid,
    pub name: String,
    /// Coverage amounts (cents) below this skip manual review
    pub auto_approve_max: i64,
    pub is_active: bool,
}

/// Covered item
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub category_id: Uuid,
    pub policy_dependent_id: Option<Uuid>,
    pub name: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    /// Cents
    pub coverage_amount: i64,
    pub coverage_status: CoverageStatus,
    pub status_reason: Option<String>,
    pub coverage_start_date: Option<NaiveDate>,
    pub paid_through_date: Option<NaiveDate>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create item request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub category_id: Uuid,
    pub policy_dependent_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub make: Option<String>,
    #[validate(length(max = 255))]
    pub model: Option<String>,
    #[validate(length(max = 255))]
    pub serial_number: Option<String>,
    #[validate(range(min = 1))]
    pub coverage_amount: i64,
}

/// Update item request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub policy_dependent_id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub make: Option<String>,
    #[validate(length(max = 255))]
    pub model: Option<String>,
    #[validate(length(max = 255))]
    pub serial_number: Option<String>,
    #[validate(range(min = 1))]
    pub coverage_amount: Option<i64>,
}

/// Reason given when denying or requesting revision
#[derive(Debug, Deserialize, Validate)]
pub struct StatusReasonRequest {
    #[validate(length(min = 1, max = 4000))]
    pub reason: String,
}

//! Ledger domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ledger_entry_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    NewCoverage,
    CoverageRefund,
    ClaimPayout,
}

/// Ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub item_id: Option<Uuid>,
    pub claim_id: Option<Uuid>,
    pub entry_type: LedgerEntryType,
    /// Cents; refunds and payouts are negative
    pub amount: i64,
    pub entry_date: NaiveDate,
    pub reconciled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// New ledger entry (before insert)
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub policy_id: Uuid,
    pub item_id: Option<Uuid>,
    pub claim_id: Option<Uuid>,
    pub entry_type: LedgerEntryType,
    pub amount: i64,
    pub entry_date: NaiveDate,
}

/// Ledger report (period summary)
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerReport {
    pub id: Uuid,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_premiums: i64,
    pub total_refunds: i64,
    pub total_payouts: i64,
    pub entry_count: i64,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Create ledger report request
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_period"))]
pub struct CreateLedgerReportRequest {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

fn validate_period(req: &CreateLedgerReportRequest) -> Result<(), ValidationError> {
    if req.period_end < req.period_start {
        return Err(ValidationError::new("period_end_before_start"));
    }
    Ok(())
}

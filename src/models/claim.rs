//! Claim domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Draft,
    Pending,
    Review1,
    Review2,
    Review3,
    Receipt,
    Revision,
    Approved,
    Denied,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 9] = [
        ClaimStatus::Draft,
        ClaimStatus::Pending,
        ClaimStatus::Review1,
        ClaimStatus::Review2,
        ClaimStatus::Review3,
        ClaimStatus::Receipt,
        ClaimStatus::Revision,
        ClaimStatus::Approved,
        ClaimStatus::Denied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Pending => "pending",
            ClaimStatus::Review1 => "review1",
            ClaimStatus::Review2 => "review2",
            ClaimStatus::Review3 => "review3",
            ClaimStatus::Receipt => "receipt",
            ClaimStatus::Revision => "revision",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Denied => "denied",
        }
    }

    /// States in which the claim's members may still edit it
    pub fn is_editable_by_member(&self) -> bool {
        matches!(self, ClaimStatus::Draft | ClaimStatus::Revision | ClaimStatus::Receipt)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "incident_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Theft,
    Impact,
    Lightning,
    WaterDamage,
    Evacuation,
    #[default]
    Other,
}

/// Claim
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Claim {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub reference_number: String,
    pub incident_date: Option<NaiveDate>,
    pub incident_type: IncidentType,
    pub incident_description: String,
    pub status: ClaimStatus,
    pub status_reason: Option<String>,
    /// Cents
    pub total_payout: i64,
    pub review_date: Option<DateTime<Utc>>,
    pub reviewer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create claim request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimRequest {
    pub incident_date: Option<NaiveDate>,
    #[serde(default)]
    pub incident_type: IncidentType,
    #[validate(length(min = 1, max = 4000))]
    pub incident_description: String,
}

/// Update claim request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClaimRequest {
    pub incident_date: Option<NaiveDate>,
    pub incident_type: Option<IncidentType>,
    #[validate(length(min = 1, max = 4000))]
    pub incident_description: Option<String>,
}

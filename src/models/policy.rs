//! Policy domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "policy_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    #[default]
    Household,
    Team,
}

/// Policy (owner of items, claims and members)
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Policy {
    pub id: Uuid,
    pub name: String,
    pub policy_type: PolicyType,
    pub household_id: Option<String>,
    pub cost_center: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Policy member (user with access to a policy)
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PolicyUser {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dependent_relationship", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DependentRelationship {
    #[default]
    Spouse,
    Child,
}

/// Dependent covered under a household policy
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PolicyDependent {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub name: String,
    pub relationship: DependentRelationship,
    pub child_birth_year: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Strike recorded against a policy by an admin
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Strike {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create policy request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePolicyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub policy_type: PolicyType,
    pub household_id: Option<String>,
    pub cost_center: Option<String>,
}

/// Update policy request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePolicyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub household_id: Option<String>,
    pub cost_center: Option<String>,
}

/// Create or update dependent request
#[derive(Debug, Deserialize, Validate)]
pub struct DependentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub relationship: DependentRelationship,
    #[validate(range(min = 1900, max = 2200))]
    pub child_birth_year: Option<i32>,
}

/// Create or update strike request
#[derive(Debug, Deserialize, Validate)]
pub struct StrikeRequest {
    #[validate(length(min = 1, max = 4000))]
    pub description: String,
}

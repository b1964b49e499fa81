//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Application role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "app_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    #[default]
    User,
    /// 理赔初审（Review1/Review2）
    Steward,
    /// 理赔终审（Review3）
    Signator,
    Admin,
}

/// Capability a review stage demands from the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Steward,
    Signator,
}

impl AppRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, AppRole::Steward | AppRole::Signator | AppRole::Admin)
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Steward => self.is_admin(),
            Capability::Signator => matches!(self, AppRole::Signator | AppRole::Admin),
        }
    }
}

/// User
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub app_role: AppRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.app_role.is_admin()
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Update user request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    /// Only honoured for admins
    pub app_role: Option<AppRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_roles() {
        assert!(!AppRole::User.is_admin());
        assert!(AppRole::Steward.is_admin());
        assert!(AppRole::Signator.is_admin());
        assert!(AppRole::Admin.is_admin());
    }

    #[test]
    fn test_review_capabilities() {
        assert!(!AppRole::User.has(Capability::Steward));
        assert!(AppRole::Steward.has(Capability::Steward));
        assert!(!AppRole::Steward.has(Capability::Signator));
        assert!(AppRole::Signator.has(Capability::Signator));
        assert!(AppRole::Admin.has(Capability::Signator));
    }
}

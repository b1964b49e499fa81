//! Policy dependent and strike repositories

use crate::{error::AppError, models::policy::*};
use sqlx::PgConnection;
use uuid::Uuid;

pub struct PolicyDependentRepository;

impl PolicyDependentRepository {
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<PolicyDependent>, AppError> {
        let dependent =
            sqlx::query_as::<_, PolicyDependent>("SELECT * FROM policy_dependents WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(dependent)
    }

    pub async fn list_by_policy(conn: &mut PgConnection, policy_id: Uuid) -> Result<Vec<PolicyDependent>, AppError> {
        let dependents = sqlx::query_as::<_, PolicyDependent>(
            "SELECT * FROM policy_dependents WHERE policy_id = $1 ORDER BY created_at",
        )
        .bind(policy_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(dependents)
    }

    pub async fn create(
        conn: &mut PgConnection,
        policy_id: Uuid,
        req: &DependentRequest,
    ) -> Result<PolicyDependent, AppError> {
        let dependent = sqlx::query_as::<_, PolicyDependent>(
            r#"
            INSERT INTO policy_dependents (policy_id, name, relationship, child_birth_year)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(policy_id)
        .bind(&req.name)
        .bind(req.relationship)
        .bind(req.child_birth_year)
        .fetch_one(&mut *conn)
        .await?;

        Ok(dependent)
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        req: &DependentRequest,
    ) -> Result<PolicyDependent, AppError> {
        let dependent = sqlx::query_as::<_, PolicyDependent>(
            r#"
            UPDATE policy_dependents
            SET name = $2, relationship = $3, child_birth_year = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(req.relationship)
        .bind(req.child_birth_year)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("policy dependent {}", id)))?;

        Ok(dependent)
    }

    /// 仍有物品引用的被保人不能删除
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM items WHERE policy_dependent_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        if in_use {
            return Err(AppError::validation("dependent is still referenced by covered items"));
        }

        let result = sqlx::query("DELETE FROM policy_dependents WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct StrikeRepository;

impl StrikeRepository {
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Strike>, AppError> {
        let strike = sqlx::query_as::<_, Strike>("SELECT * FROM strikes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(strike)
    }

    pub async fn list_by_policy(conn: &mut PgConnection, policy_id: Uuid) -> Result<Vec<Strike>, AppError> {
        let strikes = sqlx::query_as::<_, Strike>(
            "SELECT * FROM strikes WHERE policy_id = $1 ORDER BY created_at DESC",
        )
        .bind(policy_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(strikes)
    }

    pub async fn create(conn: &mut PgConnection, policy_id: Uuid, req: &StrikeRequest) -> Result<Strike, AppError> {
        let strike = sqlx::query_as::<_, Strike>(
            "INSERT INTO strikes (policy_id, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(policy_id)
        .bind(&req.description)
        .fetch_one(&mut *conn)
        .await?;

        Ok(strike)
    }

    pub async fn update(conn: &mut PgConnection, id: Uuid, req: &StrikeRequest) -> Result<Strike, AppError> {
        let strike = sqlx::query_as::<_, Strike>(
            "UPDATE strikes SET description = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&req.description)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("strike {}", id)))?;

        Ok(strike)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM strikes WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

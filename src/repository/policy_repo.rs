//! Policy and membership repository (数据库访问层)

use crate::{error::AppError, models::policy::*};
use sqlx::PgConnection;
use uuid::Uuid;

pub struct PolicyRepository;

impl PolicyRepository {
    /// 根据 ID 查找保单
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Policy>, AppError> {
        let policy = sqlx::query_as::<_, Policy>("SELECT * FROM policies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(policy)
    }

    pub async fn exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM policies WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists)
    }

    /// 用户是否为保单成员
    pub async fn is_member(conn: &mut PgConnection, policy_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let is_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM policy_users WHERE policy_id = $1 AND user_id = $2)",
        )
        .bind(policy_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(is_member)
    }

    /// 列出用户所属的保单
    pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<Policy>, AppError> {
        let policies = sqlx::query_as::<_, Policy>(
            r#"
            SELECT p.* FROM policies p
            JOIN policy_users pu ON pu.policy_id = p.id
            WHERE pu.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(policies)
    }

    pub async fn list_all(conn: &mut PgConnection, limit: i64, offset: i64) -> Result<Vec<Policy>, AppError> {
        let policies = sqlx::query_as::<_, Policy>(
            "SELECT * FROM policies ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(policies)
    }

    /// 创建保单，创建者自动成为成员
    pub async fn create(
        conn: &mut PgConnection,
        req: &CreatePolicyRequest,
        created_by: Uuid,
    ) -> Result<Policy, AppError> {
        let policy = sqlx::query_as::<_, Policy>(
            r#"
            INSERT INTO policies (name, policy_type, household_id, cost_center)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(req.policy_type)
        .bind(&req.household_id)
        .bind(&req.cost_center)
        .fetch_one(&mut *conn)
        .await?;

        Self::add_member(conn, policy.id, created_by).await?;

        Ok(policy)
    }

    /// 更新保单
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        req: &UpdatePolicyRequest,
    ) -> Result<Policy, AppError> {
        let policy = sqlx::query_as::<_, Policy>(
            r#"
            UPDATE policies
            SET
                name = COALESCE($2, name),
                household_id = COALESCE($3, household_id),
                cost_center = COALESCE($4, cost_center),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.household_id)
        .bind(&req.cost_center)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("policy {}", id)))?;

        Ok(policy)
    }

    pub async fn add_member(
        conn: &mut PgConnection,
        policy_id: Uuid,
        user_id: Uuid,
    ) -> Result<PolicyUser, AppError> {
        let member = sqlx::query_as::<_, PolicyUser>(
            r#"
            INSERT INTO policy_users (policy_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (policy_id, user_id) DO UPDATE SET policy_id = EXCLUDED.policy_id
            RETURNING *
            "#,
        )
        .bind(policy_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(member)
    }

    pub async fn find_member_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<PolicyUser>, AppError> {
        let member = sqlx::query_as::<_, PolicyUser>("SELECT * FROM policy_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(member)
    }

    pub async fn list_members(conn: &mut PgConnection, policy_id: Uuid) -> Result<Vec<PolicyUser>, AppError> {
        let members = sqlx::query_as::<_, PolicyUser>(
            "SELECT * FROM policy_users WHERE policy_id = $1 ORDER BY created_at",
        )
        .bind(policy_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(members)
    }

    pub async fn count_members(conn: &mut PgConnection, policy_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM policy_users WHERE policy_id = $1")
            .bind(policy_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    pub async fn delete_member(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM policy_users WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

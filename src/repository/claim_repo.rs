//! Claim and claim item repositories

use crate::{
    error::AppError,
    models::{claim::*, claim_item::*},
};
use sqlx::PgConnection;
use uuid::Uuid;

use super::item_repo::stale;

/// 一次理赔状态变更
#[derive(Debug, Clone)]
pub struct ClaimStatusChange {
    pub from: ClaimStatus,
    pub to: ClaimStatus,
    pub reason: Option<String>,
    /// 审核动作记录审核人与审核时间
    pub reviewer_id: Option<Uuid>,
    /// 终审时写入
    pub total_payout: Option<i64>,
}

pub struct ClaimRepository;

impl ClaimRepository {
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Claim>, AppError> {
        let claim = sqlx::query_as::<_, Claim>("SELECT * FROM claims WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(claim)
    }

    pub async fn list_by_policy(conn: &mut PgConnection, policy_id: Uuid) -> Result<Vec<Claim>, AppError> {
        let claims = sqlx::query_as::<_, Claim>(
            "SELECT * FROM claims WHERE policy_id = $1 ORDER BY created_at DESC",
        )
        .bind(policy_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(claims)
    }

    pub async fn list_all(
        conn: &mut PgConnection,
        status: Option<ClaimStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Claim>, AppError> {
        let claims = sqlx::query_as::<_, Claim>(
            r#"
            SELECT * FROM claims
            WHERE ($1::claim_status IS NULL OR status = $1)
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(claims)
    }

    pub async fn create(
        conn: &mut PgConnection,
        policy_id: Uuid,
        reference_number: &str,
        req: &CreateClaimRequest,
    ) -> Result<Claim, AppError> {
        let claim = sqlx::query_as::<_, Claim>(
            r#"
            INSERT INTO claims (policy_id, reference_number, incident_date, incident_type, incident_description, status)
            VALUES ($1, $2, $3, $4, $5, 'draft')
            RETURNING *
            "#,
        )
        .bind(policy_id)
        .bind(reference_number)
        .bind(req.incident_date)
        .bind(req.incident_type)
        .bind(&req.incident_description)
        .fetch_one(&mut *conn)
        .await?;

        Ok(claim)
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        expected: ClaimStatus,
        req: &UpdateClaimRequest,
    ) -> Result<Claim, AppError> {
        let claim = sqlx::query_as::<_, Claim>(
            r#"
            UPDATE claims
            SET
                incident_date = COALESCE($3, incident_date),
                incident_type = COALESCE($4, incident_type),
                incident_description = COALESCE($5, incident_description),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(req.incident_date)
        .bind(req.incident_type)
        .bind(&req.incident_description)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| stale("claim", id))?;

        Ok(claim)
    }

    /// 比较并更新理赔状态
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        change: &ClaimStatusChange,
    ) -> Result<Claim, AppError> {
        let claim = sqlx::query_as::<_, Claim>(
            r#"
            UPDATE claims
            SET
                status = $3,
                status_reason = $4,
                reviewer_id = COALESCE($5, reviewer_id),
                review_date = CASE WHEN $5 IS NULL THEN review_date ELSE NOW() END,
                total_payout = COALESCE($6, total_payout),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.from)
        .bind(change.to)
        .bind(&change.reason)
        .bind(change.reviewer_id)
        .bind(change.total_payout)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| stale("claim", id))?;

        Ok(claim)
    }

    /// 删除草稿理赔，理赔项随外键级联删除
    pub async fn delete(conn: &mut PgConnection, id: Uuid, expected: ClaimStatus) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM claims WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(expected)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(stale("claim", id));
        }
        Ok(())
    }
}

pub struct ClaimItemRepository;

impl ClaimItemRepository {
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<ClaimItem>, AppError> {
        let claim_item = sqlx::query_as::<_, ClaimItem>("SELECT * FROM claim_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(claim_item)
    }

    pub async fn list_by_claim(conn: &mut PgConnection, claim_id: Uuid) -> Result<Vec<ClaimItem>, AppError> {
        let claim_items = sqlx::query_as::<_, ClaimItem>(
            "SELECT * FROM claim_items WHERE claim_id = $1 ORDER BY created_at",
        )
        .bind(claim_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(claim_items)
    }

    pub async fn exists_for_item(conn: &mut PgConnection, claim_id: Uuid, item_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM claim_items WHERE claim_id = $1 AND item_id = $2)",
        )
        .bind(claim_id)
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    pub async fn create(
        conn: &mut PgConnection,
        claim_id: Uuid,
        req: &CreateClaimItemRequest,
    ) -> Result<ClaimItem, AppError> {
        let claim_item = sqlx::query_as::<_, ClaimItem>(
            r#"
            INSERT INTO claim_items (
                claim_id, item_id, status, is_repairable, repair_estimate,
                replace_estimate, payout_option, fmv
            )
            VALUES ($1, $2, 'draft', $3, COALESCE($4, 0), COALESCE($5, 0), $6, COALESCE($7, 0))
            RETURNING *
            "#,
        )
        .bind(claim_id)
        .bind(req.item_id)
        .bind(req.is_repairable)
        .bind(req.repair_estimate)
        .bind(req.replace_estimate)
        .bind(req.payout_option)
        .bind(req.fmv)
        .fetch_one(&mut *conn)
        .await?;

        Ok(claim_item)
    }

    /// 更新理赔项字段与状态，按旧状态比较
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        expected: ClaimItemStatus,
        status: ClaimItemStatus,
        req: &UpdateClaimItemRequest,
        reviewer_id: Option<Uuid>,
    ) -> Result<ClaimItem, AppError> {
        let claim_item = sqlx::query_as::<_, ClaimItem>(
            r#"
            UPDATE claim_items
            SET
                status = $3,
                is_repairable = COALESCE($4, is_repairable),
                repair_estimate = COALESCE($5, repair_estimate),
                repair_actual = COALESCE($6, repair_actual),
                replace_estimate = COALESCE($7, replace_estimate),
                replace_actual = COALESCE($8, replace_actual),
                payout_option = COALESCE($9, payout_option),
                fmv = COALESCE($10, fmv),
                reviewer_id = COALESCE($11, reviewer_id),
                review_date = CASE WHEN $11 IS NULL THEN review_date ELSE NOW() END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(status)
        .bind(req.is_repairable)
        .bind(req.repair_estimate)
        .bind(req.repair_actual)
        .bind(req.replace_estimate)
        .bind(req.replace_actual)
        .bind(req.payout_option)
        .bind(req.fmv)
        .bind(reviewer_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| stale("claim item", id))?;

        Ok(claim_item)
    }

    /// 只变更状态（随理赔动作联动），可同时写入赔付金额
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        from: ClaimItemStatus,
        to: ClaimItemStatus,
        payout_amount: Option<i64>,
    ) -> Result<ClaimItem, AppError> {
        let claim_item = sqlx::query_as::<_, ClaimItem>(
            r#"
            UPDATE claim_items
            SET status = $3, payout_amount = COALESCE($4, payout_amount), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(payout_amount)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| stale("claim item", id))?;

        Ok(claim_item)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM claim_items WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

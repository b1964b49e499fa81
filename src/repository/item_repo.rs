//! Item and category repository
//! 状态写入一律按旧状态做比较更新，0 行即并发冲突

use crate::{error::AppError, models::item::*};
use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

/// 一次保障状态变更
#[derive(Debug, Clone)]
pub struct ItemStatusChange {
    pub from: CoverageStatus,
    pub to: CoverageStatus,
    pub reason: Option<String>,
    /// 批准时写入
    pub paid_through_date: Option<NaiveDate>,
    pub mark_approved: bool,
}

impl ItemStatusChange {
    pub fn new(from: CoverageStatus, to: CoverageStatus) -> Self {
        Self {
            from,
            to,
            reason: None,
            paid_through_date: None,
            mark_approved: false,
        }
    }
}

pub struct ItemRepository;

impl ItemRepository {
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Item>, AppError> {
        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(item)
    }

    /// 物品所属保单
    pub async fn find_policy_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Uuid>, AppError> {
        let policy_id: Option<Uuid> = sqlx::query_scalar("SELECT policy_id FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(policy_id)
    }

    pub async fn list_by_policy(conn: &mut PgConnection, policy_id: Uuid) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE policy_id = $1 ORDER BY created_at DESC",
        )
        .bind(policy_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// 管理员审核列表，可按状态过滤
    pub async fn list_all(
        conn: &mut PgConnection,
        status: Option<CoverageStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Item>, AppError> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT * FROM items
            WHERE ($1::coverage_status IS NULL OR coverage_status = $1)
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    pub async fn find_category(conn: &mut PgConnection, id: Uuid) -> Result<Option<ItemCategory>, AppError> {
        let category = sqlx::query_as::<_, ItemCategory>("SELECT * FROM item_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(category)
    }

    pub async fn create(conn: &mut PgConnection, policy_id: Uuid, req: &CreateItemRequest) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                policy_id, category_id, policy_dependent_id, name, make, model,
                serial_number, coverage_amount, coverage_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft')
            RETURNING *
            "#,
        )
        .bind(policy_id)
        .bind(req.category_id)
        .bind(req.policy_dependent_id)
        .bind(&req.name)
        .bind(&req.make)
        .bind(&req.model)
        .bind(&req.serial_number)
        .bind(req.coverage_amount)
        .fetch_one(&mut *conn)
        .await?;

        Ok(item)
    }

    /// 更新可编辑字段；`expected` 防止与状态变更并发覆盖
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        expected: CoverageStatus,
        req: &UpdateItemRequest,
    ) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET
                name = COALESCE($3, name),
                category_id = COALESCE($4, category_id),
                policy_dependent_id = COALESCE($5, policy_dependent_id),
                make = COALESCE($6, make),
                model = COALESCE($7, model),
                serial_number = COALESCE($8, serial_number),
                coverage_amount = COALESCE($9, coverage_amount),
                updated_at = NOW()
            WHERE id = $1 AND coverage_status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(&req.name)
        .bind(req.category_id)
        .bind(req.policy_dependent_id)
        .bind(&req.make)
        .bind(&req.model)
        .bind(&req.serial_number)
        .bind(req.coverage_amount)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| stale("item", id))?;

        Ok(item)
    }

    /// 比较并更新保障状态
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        change: &ItemStatusChange,
    ) -> Result<Item, AppError> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET
                coverage_status = $3,
                status_reason = $4,
                paid_through_date = COALESCE($5, paid_through_date),
                approved_at = CASE WHEN $6 THEN NOW() ELSE approved_at END,
                coverage_start_date = CASE WHEN $6 THEN CURRENT_DATE ELSE coverage_start_date END,
                updated_at = NOW()
            WHERE id = $1 AND coverage_status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.from)
        .bind(change.to)
        .bind(&change.reason)
        .bind(change.paid_through_date)
        .bind(change.mark_approved)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| stale("item", id))?;

        Ok(item)
    }

    pub async fn count_claim_items(conn: &mut PgConnection, id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM claim_items WHERE item_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(count)
    }

    /// 硬删除，仍按旧状态比较
    pub async fn delete(conn: &mut PgConnection, id: Uuid, expected: CoverageStatus) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1 AND coverage_status = $2")
            .bind(id)
            .bind(expected)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(stale("item", id));
        }
        Ok(())
    }
}

pub(crate) fn stale(entity: &str, id: Uuid) -> AppError {
    AppError::conflict(&format!("{} {} was modified by another request", entity, id))
}

//! Ledger repository

use crate::{error::AppError, models::ledger::*};
use chrono::NaiveDate;
use sqlx::PgConnection;
use uuid::Uuid;

/// 期间汇总
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct LedgerTotals {
    pub total_premiums: i64,
    pub total_refunds: i64,
    pub total_payouts: i64,
    pub entry_count: i64,
}

pub struct LedgerRepository;

impl LedgerRepository {
    pub async fn insert(conn: &mut PgConnection, entry: &NewLedgerEntry) -> Result<LedgerEntry, AppError> {
        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO ledger_entries (policy_id, item_id, claim_id, entry_type, amount, entry_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entry.policy_id)
        .bind(entry.item_id)
        .bind(entry.claim_id)
        .bind(entry.entry_type)
        .bind(entry.amount)
        .bind(entry.entry_date)
        .fetch_one(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// 物品是否已有对过账的流水
    pub async fn has_reconciled_for_item(conn: &mut PgConnection, item_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM ledger_entries WHERE item_id = $1 AND reconciled_at IS NOT NULL)",
        )
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    pub async fn delete_unreconciled_for_item(conn: &mut PgConnection, item_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM ledger_entries WHERE item_id = $1 AND reconciled_at IS NULL",
        )
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn totals(
        conn: &mut PgConnection,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<LedgerTotals, AppError> {
        let totals = sqlx::query_as::<_, LedgerTotals>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE entry_type = 'new_coverage'), 0)::BIGINT AS total_premiums,
                COALESCE(SUM(amount) FILTER (WHERE entry_type = 'coverage_refund'), 0)::BIGINT AS total_refunds,
                COALESCE(SUM(amount) FILTER (WHERE entry_type = 'claim_payout'), 0)::BIGINT AS total_payouts,
                COUNT(*) AS entry_count
            FROM ledger_entries
            WHERE entry_date BETWEEN $1 AND $2
            "#,
        )
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&mut *conn)
        .await?;

        Ok(totals)
    }

    /// 标记期间内流水为已对账
    pub async fn reconcile(
        conn: &mut PgConnection,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_entries SET reconciled_at = NOW()
            WHERE entry_date BETWEEN $1 AND $2 AND reconciled_at IS NULL
            "#,
        )
        .bind(period_start)
        .bind(period_end)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn create_report(
        conn: &mut PgConnection,
        period_start: NaiveDate,
        period_end: NaiveDate,
        totals: &LedgerTotals,
        created_by: Uuid,
    ) -> Result<LedgerReport, AppError> {
        let report = sqlx::query_as::<_, LedgerReport>(
            r#"
            INSERT INTO ledger_reports (
                period_start, period_end, total_premiums, total_refunds,
                total_payouts, entry_count, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(period_start)
        .bind(period_end)
        .bind(totals.total_premiums)
        .bind(totals.total_refunds)
        .bind(totals.total_payouts)
        .bind(totals.entry_count)
        .bind(created_by)
        .fetch_one(&mut *conn)
        .await?;

        Ok(report)
    }

    pub async fn find_report(conn: &mut PgConnection, id: Uuid) -> Result<Option<LedgerReport>, AppError> {
        let report = sqlx::query_as::<_, LedgerReport>("SELECT * FROM ledger_reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(report)
    }

    pub async fn list_reports(conn: &mut PgConnection, limit: i64, offset: i64) -> Result<Vec<LedgerReport>, AppError> {
        let reports = sqlx::query_as::<_, LedgerReport>(
            "SELECT * FROM ledger_reports ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        Ok(reports)
    }
}

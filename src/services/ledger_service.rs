//! 账务报表服务

use sqlx::PgConnection;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::Result;
use crate::models::ledger::{CreateLedgerReportRequest, LedgerReport};
use crate::models::user::User;
use crate::repository::LedgerRepository;

/// 账务报表服务
#[derive(Default)]
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// 汇总期间流水并生成报表，期间内流水随之标记为已对账
    #[instrument(skip(self, conn, actor, req), fields(period_start = %req.period_start, period_end = %req.period_end))]
    pub async fn create_report(
        &self,
        conn: &mut PgConnection,
        actor: &User,
        req: &CreateLedgerReportRequest,
    ) -> Result<LedgerReport> {
        req.validate()?;

        let totals = LedgerRepository::totals(conn, req.period_start, req.period_end).await?;
        let reconciled = LedgerRepository::reconcile(conn, req.period_start, req.period_end).await?;
        let report =
            LedgerRepository::create_report(conn, req.period_start, req.period_end, &totals, actor.id).await?;

        info!(
            report_id = %report.id,
            entry_count = totals.entry_count,
            reconciled,
            "Ledger report created"
        );
        Ok(report)
    }

    pub async fn list(&self, conn: &mut PgConnection, limit: i64, offset: i64) -> Result<Vec<LedgerReport>> {
        LedgerRepository::list_reports(conn, limit, offset).await
    }
}

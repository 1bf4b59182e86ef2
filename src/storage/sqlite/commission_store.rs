//! SQLite CommissionStore implementation.

use std::str::FromStr;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_query::{Asterisk, Expr, OnConflict, Order, Query, SimpleExpr, SqliteQueryBuilder};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::interfaces::{CommissionStore, Result, StorageError};
use crate::model::{
    AuditRecord, CommissionEntry, CommissionMonth, CustomerId, EntryId, MonthlyCommissionSummary,
    OrderId, RepId,
};
use crate::storage::schema::{CommissionAudit, CommissionEntries, MonthlySummaries, SCHEMA};
use crate::utils::retry::{is_transient, store_backoff};

/// SQLite implementation of CommissionStore.
///
/// Decimals are stored as TEXT so no precision is lost on the round trip.
pub struct SqliteCommissionStore {
    pool: SqlitePool,
    backoff: ExponentialBuilder,
}

impl SqliteCommissionStore {
    /// Create a new SQLite commission store.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            backoff: store_backoff(),
        }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Run a whole change set inside one `BEGIN IMMEDIATE` transaction.
    async fn write_changes(
        &self,
        changes: &[(CommissionEntry, AuditRecord)],
        summaries: &[MonthlyCommissionSummary],
        max_batch_size: usize,
    ) -> Result<()> {
        // BEGIN IMMEDIATE takes the write lock upfront so concurrent writers
        // wait on busy_timeout instead of failing to upgrade mid-transaction.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        match Self::write_all(&mut conn, changes, summaries, max_batch_size).await {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(())
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn write_all(
        conn: &mut SqliteConnection,
        changes: &[(CommissionEntry, AuditRecord)],
        summaries: &[MonthlyCommissionSummary],
        max_batch_size: usize,
    ) -> Result<()> {
        for chunk in changes.chunks(max_batch_size.max(1)) {
            Self::write_chunk(conn, chunk).await?;
            debug!(size = chunk.len(), "entry batch written");
        }
        for summary in summaries {
            sqlx::query(&summary_upsert(summary))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// One multi-row upsert for the entries and one insert for their audit.
    async fn write_chunk(
        conn: &mut SqliteConnection,
        chunk: &[(CommissionEntry, AuditRecord)],
    ) -> Result<()> {
        let mut upsert = Query::insert();
        upsert
            .into_table(CommissionEntries::Table)
            .columns([
                CommissionEntries::Id,
                CommissionEntries::OrderId,
                CommissionEntries::RepId,
                CommissionEntries::CustomerId,
                CommissionEntries::Segment,
                CommissionEntries::RelationshipStatus,
                CommissionEntries::CommissionMonth,
                CommissionEntries::OrderRevenue,
                CommissionEntries::CommissionRate,
                CommissionEntries::CommissionAmount,
                CommissionEntries::ExcludeFromCommission,
                CommissionEntries::IsOverride,
                CommissionEntries::OriginalRate,
                CommissionEntries::RateComment,
                CommissionEntries::RateTableVersion,
                CommissionEntries::CreatedAt,
                CommissionEntries::UpdatedAt,
            ])
            .on_conflict(
                OnConflict::column(CommissionEntries::Id)
                    .update_columns([
                        CommissionEntries::CustomerId,
                        CommissionEntries::Segment,
                        CommissionEntries::RelationshipStatus,
                        CommissionEntries::CommissionMonth,
                        CommissionEntries::OrderRevenue,
                        CommissionEntries::CommissionRate,
                        CommissionEntries::CommissionAmount,
                        CommissionEntries::ExcludeFromCommission,
                        CommissionEntries::IsOverride,
                        CommissionEntries::OriginalRate,
                        CommissionEntries::RateComment,
                        CommissionEntries::RateTableVersion,
                        CommissionEntries::UpdatedAt,
                    ])
                    .to_owned(),
            );

        let mut audit = Query::insert();
        audit.into_table(CommissionAudit::Table).columns([
            CommissionAudit::EntryId,
            CommissionAudit::Action,
            CommissionAudit::Reason,
            CommissionAudit::RecordedAt,
        ]);

        for (entry, record) in chunk {
            upsert.values_panic(entry_values(entry));
            let action = serde_json::to_string(&record.action)?;
            audit.values_panic([
                record.entry_id.to_string().into(),
                action.into(),
                record.reason.clone().into(),
                record.at.to_rfc3339().into(),
            ]);
        }

        sqlx::query(&upsert.to_string(SqliteQueryBuilder))
            .execute(&mut *conn)
            .await?;
        sqlx::query(&audit.to_string(SqliteQueryBuilder))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

fn entry_values(entry: &CommissionEntry) -> [SimpleExpr; 17] {
    [
        entry.id.to_string().into(),
        entry.order_id.as_str().into(),
        entry.rep_id.as_str().into(),
        entry.customer_id.as_str().into(),
        entry.segment.as_str().into(),
        entry.relationship_status.as_str().into(),
        entry.commission_month.to_string().into(),
        entry.order_revenue.to_string().into(),
        entry.commission_rate.to_string().into(),
        entry.commission_amount.to_string().into(),
        i64::from(entry.exclude_from_commission).into(),
        i64::from(entry.is_override).into(),
        entry.original_rate.map(|r| r.to_string()).into(),
        entry.rate_comment.clone().into(),
        entry.rate_table_version.as_str().into(),
        entry.created_at.to_rfc3339().into(),
        entry.updated_at.to_rfc3339().into(),
    ]
}

fn summary_upsert(summary: &MonthlyCommissionSummary) -> String {
    Query::insert()
        .into_table(MonthlySummaries::Table)
        .columns([
            MonthlySummaries::RepId,
            MonthlySummaries::CommissionMonth,
            MonthlySummaries::TotalRevenue,
            MonthlySummaries::TotalCommission,
            MonthlySummaries::TotalOrders,
            MonthlySummaries::OverrideCount,
            MonthlySummaries::LastRecalculated,
        ])
        .values_panic([
            summary.rep_id.as_str().into(),
            summary.commission_month.to_string().into(),
            summary.total_revenue.to_string().into(),
            summary.total_commission.to_string().into(),
            i64::from(summary.total_orders).into(),
            i64::from(summary.override_count).into(),
            summary.last_recalculated.to_rfc3339().into(),
        ])
        .on_conflict(
            OnConflict::columns([MonthlySummaries::RepId, MonthlySummaries::CommissionMonth])
                .update_columns([
                    MonthlySummaries::TotalRevenue,
                    MonthlySummaries::TotalCommission,
                    MonthlySummaries::TotalOrders,
                    MonthlySummaries::OverrideCount,
                    MonthlySummaries::LastRecalculated,
                ])
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

fn corrupt(field: &'static str, value: &str) -> StorageError {
    StorageError::Corrupt {
        field,
        value: value.to_string(),
    }
}

fn decimal(row: &SqliteRow, field: &'static str) -> Result<Decimal> {
    let raw: String = row.try_get(field)?;
    Decimal::from_str(&raw).map_err(|_| corrupt(field, &raw))
}

fn timestamp(row: &SqliteRow, field: &'static str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(field)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| corrupt(field, &raw))
}

fn month(row: &SqliteRow, field: &'static str) -> Result<CommissionMonth> {
    let raw: String = row.try_get(field)?;
    raw.parse().map_err(|_| corrupt(field, &raw))
}

/// Decode a snake_case enum column through its serde representation.
fn enum_column<T: serde::de::DeserializeOwned>(row: &SqliteRow, field: &'static str) -> Result<T> {
    let raw: String = row.try_get(field)?;
    serde_json::from_value(serde_json::Value::String(raw.clone())).map_err(|_| corrupt(field, &raw))
}

fn entry_from_row(row: &SqliteRow) -> Result<CommissionEntry> {
    let id_raw: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id_raw).map_err(|_| corrupt("id", &id_raw))?;
    let original_rate: Option<String> = row.try_get("original_rate")?;
    let original_rate = original_rate
        .map(|raw| Decimal::from_str(&raw).map_err(|_| corrupt("original_rate", &raw)))
        .transpose()?;

    Ok(CommissionEntry {
        id: EntryId::from_uuid(id),
        order_id: OrderId::new(row.try_get::<String, _>("order_id")?),
        rep_id: RepId::new(row.try_get::<String, _>("rep_id")?),
        customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?),
        segment: enum_column(row, "segment")?,
        relationship_status: enum_column(row, "relationship_status")?,
        commission_month: month(row, "commission_month")?,
        order_revenue: decimal(row, "order_revenue")?,
        commission_rate: decimal(row, "commission_rate")?,
        commission_amount: decimal(row, "commission_amount")?,
        exclude_from_commission: row.try_get::<i64, _>("exclude_from_commission")? != 0,
        is_override: row.try_get::<i64, _>("is_override")? != 0,
        original_rate,
        rate_comment: row.try_get("rate_comment")?,
        rate_table_version: row.try_get("rate_table_version")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

fn summary_from_row(row: &SqliteRow) -> Result<MonthlyCommissionSummary> {
    let total_orders: i64 = row.try_get("total_orders")?;
    let override_count: i64 = row.try_get("override_count")?;
    Ok(MonthlyCommissionSummary {
        rep_id: RepId::new(row.try_get::<String, _>("rep_id")?),
        commission_month: month(row, "commission_month")?,
        total_revenue: decimal(row, "total_revenue")?,
        total_commission: decimal(row, "total_commission")?,
        total_orders: u32::try_from(total_orders)
            .map_err(|_| corrupt("total_orders", &total_orders.to_string()))?,
        override_count: u32::try_from(override_count)
            .map_err(|_| corrupt("override_count", &override_count.to_string()))?,
        last_recalculated: timestamp(row, "last_recalculated")?,
    })
}

#[async_trait]
impl CommissionStore for SqliteCommissionStore {
    async fn get_entry(&self, id: EntryId) -> Result<Option<CommissionEntry>> {
        let query = Query::select()
            .column(Asterisk)
            .from(CommissionEntries::Table)
            .and_where(Expr::col(CommissionEntries::Id).eq(id.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(entry_from_row).transpose()
    }

    async fn apply_changes(
        &self,
        changes: &[(CommissionEntry, AuditRecord)],
        summaries: &[MonthlyCommissionSummary],
        max_batch_size: usize,
    ) -> Result<()> {
        (|| async { self.write_changes(changes, summaries, max_batch_size).await })
            .retry(self.backoff)
            .when(is_transient)
            .notify(|e, dur| {
                warn!(
                    entries = changes.len(),
                    summaries = summaries.len(),
                    error = %e,
                    ?dur,
                    "retrying commission write"
                )
            })
            .await?;
        debug!(
            entries = changes.len(),
            summaries = summaries.len(),
            "commission changes committed"
        );
        Ok(())
    }

    async fn list_entries(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Vec<CommissionEntry>> {
        let query = Query::select()
            .column(Asterisk)
            .from(CommissionEntries::Table)
            .and_where(Expr::col(CommissionEntries::RepId).eq(rep_id.as_str()))
            .and_where(Expr::col(CommissionEntries::CommissionMonth).eq(month.to_string()))
            .order_by(CommissionEntries::OrderId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn audit_trail(&self, id: EntryId) -> Result<Vec<AuditRecord>> {
        let query = Query::select()
            .columns([
                CommissionAudit::Action,
                CommissionAudit::Reason,
                CommissionAudit::RecordedAt,
            ])
            .from(CommissionAudit::Table)
            .and_where(Expr::col(CommissionAudit::EntryId).eq(id.to_string()))
            .order_by(CommissionAudit::Seq, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<AuditRecord> {
                let action: String = row.try_get("action")?;
                Ok(AuditRecord {
                    entry_id: id,
                    action: serde_json::from_str(&action)?,
                    reason: row.try_get("reason")?,
                    at: timestamp(row, "recorded_at")?,
                })
            })
            .collect()
    }

    async fn get_summary(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Option<MonthlyCommissionSummary>> {
        let query = Query::select()
            .column(Asterisk)
            .from(MonthlySummaries::Table)
            .and_where(Expr::col(MonthlySummaries::RepId).eq(rep_id.as_str()))
            .and_where(Expr::col(MonthlySummaries::CommissionMonth).eq(month.to_string()))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        row.as_ref().map(summary_from_row).transpose()
    }

    async fn replace_summary(&self, summary: &MonthlyCommissionSummary) -> Result<()> {
        let upsert = summary_upsert(summary);
        (|| async {
            sqlx::query(&upsert).execute(&self.pool).await?;
            Ok::<(), StorageError>(())
        })
        .retry(self.backoff)
        .when(is_transient)
        .notify(|e: &StorageError, dur| {
            warn!(summary = %summary.key(), error = %e, ?dur, "retrying summary write")
        })
        .await
    }

    async fn list_summaries(
        &self,
        month: CommissionMonth,
    ) -> Result<Vec<MonthlyCommissionSummary>> {
        let query = Query::select()
            .column(Asterisk)
            .from(MonthlySummaries::Table)
            .and_where(Expr::col(MonthlySummaries::CommissionMonth).eq(month.to_string()))
            .order_by(MonthlySummaries::RepId, Order::Asc)
            .to_string(SqliteQueryBuilder);

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(summary_from_row).collect()
    }
}

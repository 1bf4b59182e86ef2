//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Commission entries table schema.
#[derive(Iden)]
pub enum CommissionEntries {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "order_id"]
    OrderId,
    #[iden = "rep_id"]
    RepId,
    #[iden = "customer_id"]
    CustomerId,
    #[iden = "segment"]
    Segment,
    #[iden = "relationship_status"]
    RelationshipStatus,
    #[iden = "commission_month"]
    CommissionMonth,
    #[iden = "order_revenue"]
    OrderRevenue,
    #[iden = "commission_rate"]
    CommissionRate,
    #[iden = "commission_amount"]
    CommissionAmount,
    #[iden = "exclude_from_commission"]
    ExcludeFromCommission,
    #[iden = "is_override"]
    IsOverride,
    #[iden = "original_rate"]
    OriginalRate,
    #[iden = "rate_comment"]
    RateComment,
    #[iden = "rate_table_version"]
    RateTableVersion,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Entry audit log table schema.
#[derive(Iden)]
pub enum CommissionAudit {
    Table,
    #[iden = "seq"]
    Seq,
    #[iden = "entry_id"]
    EntryId,
    #[iden = "action"]
    Action,
    #[iden = "reason"]
    Reason,
    #[iden = "recorded_at"]
    RecordedAt,
}

/// Monthly summaries table schema.
#[derive(Iden)]
pub enum MonthlySummaries {
    Table,
    #[iden = "rep_id"]
    RepId,
    #[iden = "commission_month"]
    CommissionMonth,
    #[iden = "total_revenue"]
    TotalRevenue,
    #[iden = "total_commission"]
    TotalCommission,
    #[iden = "total_orders"]
    TotalOrders,
    #[iden = "override_count"]
    OverrideCount,
    #[iden = "last_recalculated"]
    LastRecalculated,
}

/// SQL for creating the commission entries table.
pub const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS commission_entries (
    id TEXT NOT NULL PRIMARY KEY,
    order_id TEXT NOT NULL,
    rep_id TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    segment TEXT NOT NULL,
    relationship_status TEXT NOT NULL,
    commission_month TEXT NOT NULL,
    order_revenue TEXT NOT NULL,
    commission_rate TEXT NOT NULL,
    commission_amount TEXT NOT NULL,
    exclude_from_commission INTEGER NOT NULL DEFAULT 0,
    is_override INTEGER NOT NULL DEFAULT 0,
    original_rate TEXT,
    rate_comment TEXT,
    rate_table_version TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Index backing (rep, month) entry scans.
pub const CREATE_ENTRIES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_commission_entries_rep_month
    ON commission_entries(rep_id, commission_month)
"#;

/// SQL for creating the audit table.
pub const CREATE_AUDIT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS commission_audit (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    entry_id TEXT NOT NULL,
    action TEXT NOT NULL,
    reason TEXT,
    recorded_at TEXT NOT NULL
)
"#;

/// Index backing audit trail reads.
pub const CREATE_AUDIT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_commission_audit_entry ON commission_audit(entry_id)";

/// SQL for creating the monthly summaries table.
pub const CREATE_SUMMARIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS monthly_summaries (
    rep_id TEXT NOT NULL,
    commission_month TEXT NOT NULL,
    total_revenue TEXT NOT NULL,
    total_commission TEXT NOT NULL,
    total_orders INTEGER NOT NULL,
    override_count INTEGER NOT NULL,
    last_recalculated TEXT NOT NULL,
    PRIMARY KEY (rep_id, commission_month)
)
"#;

/// Schema statements in creation order.
pub const SCHEMA: [&str; 5] = [
    CREATE_ENTRIES_TABLE,
    CREATE_ENTRIES_INDEX,
    CREATE_AUDIT_TABLE,
    CREATE_AUDIT_INDEX,
    CREATE_SUMMARIES_TABLE,
];

//! Persisted commission records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    CommissionMonth, CustomerId, EntryId, OrderId, RelationshipStatus, RepId, Segment,
};

/// One commission line per (order, rep).
///
/// `commission_amount` is always `round(order_revenue * commission_rate / 100, 2)`;
/// fields are only writable through [`crate::entry::CommissionEntryBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub(crate) id: EntryId,
    pub(crate) order_id: OrderId,
    pub(crate) rep_id: RepId,
    pub(crate) customer_id: CustomerId,
    pub(crate) segment: Segment,
    pub(crate) relationship_status: RelationshipStatus,
    pub(crate) commission_month: CommissionMonth,
    pub(crate) order_revenue: Decimal,
    pub(crate) commission_rate: Decimal,
    pub(crate) commission_amount: Decimal,
    pub(crate) exclude_from_commission: bool,
    pub(crate) is_override: bool,
    pub(crate) original_rate: Option<Decimal>,
    pub(crate) rate_comment: Option<String>,
    pub(crate) rate_table_version: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl CommissionEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    pub fn rep_id(&self) -> &RepId {
        &self.rep_id
    }

    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Segment the rate was resolved against.
    pub fn segment(&self) -> Segment {
        self.segment
    }

    /// Relationship status at the order's posting date.
    pub fn relationship_status(&self) -> RelationshipStatus {
        self.relationship_status
    }

    pub fn commission_month(&self) -> CommissionMonth {
        self.commission_month
    }

    pub fn order_revenue(&self) -> Decimal {
        self.order_revenue
    }

    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    pub fn commission_amount(&self) -> Decimal {
        self.commission_amount
    }

    pub fn is_excluded(&self) -> bool {
        self.exclude_from_commission
    }

    pub fn is_override(&self) -> bool {
        self.is_override
    }

    /// Rate in effect before the first override, if any.
    pub fn original_rate(&self) -> Option<Decimal> {
        self.original_rate
    }

    pub fn rate_comment(&self) -> Option<&str> {
        self.rate_comment.as_deref()
    }

    pub fn rate_table_version(&self) -> &str {
        &self.rate_table_version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn summary_key(&self) -> SummaryKey {
        SummaryKey::new(self.rep_id.clone(), self.commission_month)
    }
}

/// Key of a monthly summary: (rep, commission month).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SummaryKey {
    pub rep_id: RepId,
    pub month: CommissionMonth,
}

impl SummaryKey {
    pub fn new(rep_id: RepId, month: CommissionMonth) -> Self {
        Self { rep_id, month }
    }
}

impl std::fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.rep_id, self.month)
    }
}

/// Totals over the non-excluded entries of one (rep, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCommissionSummary {
    pub rep_id: RepId,
    pub commission_month: CommissionMonth,
    pub total_revenue: Decimal,
    pub total_commission: Decimal,
    pub total_orders: u32,
    pub override_count: u32,
    pub last_recalculated: DateTime<Utc>,
}

impl MonthlyCommissionSummary {
    pub fn key(&self) -> SummaryKey {
        SummaryKey::new(self.rep_id.clone(), self.commission_month)
    }

    /// Equality ignoring `last_recalculated`.
    pub fn same_totals(&self, other: &Self) -> bool {
        self.rep_id == other.rep_id
            && self.commission_month == other.commission_month
            && self.total_revenue == other.total_revenue
            && self.total_commission == other.total_commission
            && self.total_orders == other.total_orders
            && self.override_count == other.override_count
    }
}

/// What happened to an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditAction {
    Created {
        rate: Decimal,
        rate_table_version: String,
    },
    Recalculated {
        previous_revenue: Decimal,
        previous_amount: Decimal,
        rate_table_version: String,
    },
    ExclusionChanged {
        excluded: bool,
    },
    RateOverridden {
        previous_rate: Decimal,
        new_rate: Decimal,
    },
    OverrideCleared {
        restored_rate: Decimal,
    },
    Moved {
        from: CommissionMonth,
        to: CommissionMonth,
    },
}

/// Audit log line for one entry mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entry_id: EntryId,
    pub action: AuditAction,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}


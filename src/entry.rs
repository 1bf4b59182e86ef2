//! Commission entry construction and mutation.
//!
//! Every function here is pure: it takes the current entry and returns the
//! next version together with the audit record describing the change.
//! Persisting both, and recalculating the affected summaries afterwards, is
//! the caller's job (see [`crate::services::CommissionService`]).

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, Result};
use crate::model::{
    AuditAction, AuditRecord, CommissionEntry, CommissionMonth, EntryId, Order,
    RelationshipStatus, Segment,
};
use crate::rates::ResolvedRate;
use crate::revenue::RevenueAggregator;

/// `round(revenue * rate / 100, 2)`, midpoints rounded away from zero.
pub fn commission_amount(revenue: Decimal, rate: Decimal) -> Decimal {
    (revenue * rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Result of building or mutating an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryChange {
    pub entry: CommissionEntry,
    pub audit: AuditRecord,
}

impl EntryChange {
    fn new(entry: CommissionEntry, action: AuditAction, reason: Option<String>) -> Self {
        let audit = AuditRecord {
            entry_id: entry.id,
            action,
            reason,
            at: entry.updated_at,
        };
        Self { entry, audit }
    }
}

/// Customer attributes evaluated at the order's posting date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerTerms {
    pub segment: Segment,
    pub status: RelationshipStatus,
}

pub struct CommissionEntryBuilder;

impl CommissionEntryBuilder {
    /// First calculation for an order. The entry lands in the order's
    /// calendar month.
    pub fn build(
        order: &Order,
        terms: CustomerTerms,
        resolved: &ResolvedRate,
        now: DateTime<Utc>,
    ) -> EntryChange {
        let order_revenue = RevenueAggregator::order_revenue(&order.line_items);
        let entry = CommissionEntry {
            id: EntryId::for_order(&order.id, &order.rep_id),
            order_id: order.id.clone(),
            rep_id: order.rep_id.clone(),
            customer_id: order.customer_id.clone(),
            segment: terms.segment,
            relationship_status: terms.status,
            commission_month: CommissionMonth::of_date(order.posted_on),
            order_revenue,
            commission_rate: resolved.rate,
            commission_amount: commission_amount(order_revenue, resolved.rate),
            exclude_from_commission: false,
            is_override: false,
            original_rate: None,
            rate_comment: None,
            rate_table_version: resolved.rate_table_version.clone(),
            created_at: now,
            updated_at: now,
        };
        EntryChange::new(
            entry,
            AuditAction::Created {
                rate: resolved.rate,
                rate_table_version: resolved.rate_table_version.clone(),
            },
            None,
        )
    }

    /// Recompute an existing entry from fresh order data.
    ///
    /// Exclusion, commission month and any override survive; a
    /// non-overridden entry picks up the currently resolved rate.
    pub fn recalculate(
        existing: &CommissionEntry,
        order: &Order,
        terms: CustomerTerms,
        resolved: &ResolvedRate,
        now: DateTime<Utc>,
    ) -> EntryChange {
        let order_revenue = RevenueAggregator::order_revenue(&order.line_items);
        let mut entry = existing.clone();
        entry.segment = terms.segment;
        entry.relationship_status = terms.status;
        entry.order_revenue = order_revenue;
        if !entry.is_override {
            entry.commission_rate = resolved.rate;
        }
        entry.commission_amount = commission_amount(order_revenue, entry.commission_rate);
        entry.rate_table_version = resolved.rate_table_version.clone();
        entry.updated_at = now;

        EntryChange::new(
            entry,
            AuditAction::Recalculated {
                previous_revenue: existing.order_revenue,
                previous_amount: existing.commission_amount,
                rate_table_version: resolved.rate_table_version.clone(),
            },
            None,
        )
    }

    /// Force a rate. `original_rate` is captured on the first override only.
    pub fn apply_override(
        existing: &CommissionEntry,
        rate: Decimal,
        comment: &str,
        now: DateTime<Utc>,
    ) -> Result<EntryChange> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(EngineError::OverrideCommentRequired {
                entry_id: existing.id,
            });
        }
        if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
            return Err(EngineError::OverrideRateOutOfRange { rate });
        }

        let mut entry = existing.clone();
        if entry.original_rate.is_none() {
            entry.original_rate = Some(existing.commission_rate);
        }
        entry.is_override = true;
        entry.commission_rate = rate;
        entry.commission_amount = commission_amount(entry.order_revenue, rate);
        entry.rate_comment = Some(comment.to_string());
        entry.updated_at = now;

        Ok(EntryChange::new(
            entry,
            AuditAction::RateOverridden {
                previous_rate: existing.commission_rate,
                new_rate: rate,
            },
            Some(comment.to_string()),
        ))
    }

    /// Return to the pre-override baseline. `original_rate` is kept.
    pub fn clear_override(
        existing: &CommissionEntry,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<EntryChange> {
        let restored = match (existing.is_override, existing.original_rate) {
            (true, Some(rate)) => rate,
            _ => {
                return Err(EngineError::NoOverride {
                    entry_id: existing.id,
                })
            }
        };

        let mut entry = existing.clone();
        entry.is_override = false;
        entry.commission_rate = restored;
        entry.commission_amount = commission_amount(entry.order_revenue, restored);
        entry.rate_comment = None;
        entry.updated_at = now;

        Ok(EntryChange::new(
            entry,
            AuditAction::OverrideCleared {
                restored_rate: restored,
            },
            non_empty(reason),
        ))
    }

    /// Toggle exclusion. The amount is kept untouched either way.
    pub fn set_exclusion(
        existing: &CommissionEntry,
        excluded: bool,
        reason: &str,
        now: DateTime<Utc>,
    ) -> EntryChange {
        let mut entry = existing.clone();
        entry.exclude_from_commission = excluded;
        entry.updated_at = now;
        EntryChange::new(
            entry,
            AuditAction::ExclusionChanged { excluded },
            non_empty(reason),
        )
    }

    /// Move an entry to another reporting month in place.
    pub fn move_month(
        existing: &CommissionEntry,
        from: CommissionMonth,
        to: CommissionMonth,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<EntryChange> {
        if from == to {
            return Err(EngineError::SameMonthMove { month: to });
        }
        if existing.commission_month != from {
            return Err(EngineError::MonthMismatch {
                entry_id: existing.id,
                expected: from,
                actual: existing.commission_month,
            });
        }

        let mut entry = existing.clone();
        entry.commission_month = to;
        entry.updated_at = now;
        Ok(EntryChange::new(
            entry,
            AuditAction::Moved { from, to },
            non_empty(reason),
        ))
    }
}

fn non_empty(reason: &str) -> Option<String> {
    let reason = reason.trim();
    (!reason.is_empty()).then(|| reason.to_string())
}

//! Monthly commission summary recalculation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::model::{CommissionEntry, MonthlyCommissionSummary, SummaryKey};

/// Rebuilds a (rep, month) summary from its entries.
///
/// The output is a full replacement: it is derived only from the entries
/// passed in, never merged with a previously stored summary. Two runs over
/// the same entries differ only in `last_recalculated`.
pub struct MonthlySummaryRecalculator;

impl MonthlySummaryRecalculator {
    pub fn summarize(
        key: &SummaryKey,
        entries: &[CommissionEntry],
        now: DateTime<Utc>,
    ) -> MonthlyCommissionSummary {
        let mut summary = MonthlyCommissionSummary {
            rep_id: key.rep_id.clone(),
            commission_month: key.month,
            total_revenue: Decimal::ZERO,
            total_commission: Decimal::ZERO,
            total_orders: 0,
            override_count: 0,
            last_recalculated: now,
        };

        for entry in entries
            .iter()
            .filter(|e| e.rep_id == key.rep_id && e.commission_month == key.month)
            .filter(|e| !e.exclude_from_commission)
        {
            summary.total_revenue += entry.order_revenue;
            summary.total_commission += entry.commission_amount;
            summary.total_orders += 1;
            if entry.is_override {
                summary.override_count += 1;
            }
        }

        summary
    }
}

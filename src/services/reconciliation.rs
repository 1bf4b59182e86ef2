//! Reconciliation of stored monthly totals against externally maintained
//! figures.
//!
//! Read-only: a discrepancy is reported, never corrected here. Intentional
//! deviations belong on the entry as an override.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{CommissionMonth, MonthlyCommissionSummary, RepId, SummaryKey};

/// Externally supplied totals for one (rep, month).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedTotals {
    pub rep_id: RepId,
    pub commission_month: CommissionMonth,
    pub total_revenue: Decimal,
    pub total_commission: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Matched,
    Mismatch,
    /// Expected figures exist but the system has no summary.
    MissingInSystem,
    /// The system has a summary nobody supplied figures for.
    MissingExpected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationLine {
    pub key: SummaryKey,
    pub system_revenue: Decimal,
    pub expected_revenue: Decimal,
    pub system_commission: Decimal,
    pub expected_commission: Decimal,
    pub status: ReconciliationStatus,
}

impl ReconciliationLine {
    /// `system - expected` commission.
    pub fn commission_delta(&self) -> Decimal {
        self.system_commission - self.expected_commission
    }

    /// `system - expected` revenue.
    pub fn revenue_delta(&self) -> Decimal {
        self.system_revenue - self.expected_revenue
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub lines: Vec<ReconciliationLine>,
}

impl ReconciliationReport {
    pub fn discrepancies(&self) -> impl Iterator<Item = &ReconciliationLine> {
        self.lines
            .iter()
            .filter(|line| line.status != ReconciliationStatus::Matched)
    }

    pub fn is_clean(&self) -> bool {
        self.discrepancies().next().is_none()
    }
}

/// Compare summaries to expected totals. Differences up to `tolerance`
/// (absolute, on both revenue and commission) count as matched. Lines are
/// ordered by (rep, month).
pub fn reconcile(
    summaries: &[MonthlyCommissionSummary],
    expected: &[ExpectedTotals],
    tolerance: Decimal,
) -> ReconciliationReport {
    type Pair<'a> = (
        Option<&'a MonthlyCommissionSummary>,
        Option<&'a ExpectedTotals>,
    );
    let mut keyed: BTreeMap<SummaryKey, Pair<'_>> = BTreeMap::new();
    for summary in summaries {
        keyed.entry(summary.key()).or_default().0 = Some(summary);
    }
    for totals in expected {
        let key = SummaryKey::new(totals.rep_id.clone(), totals.commission_month);
        keyed.entry(key).or_default().1 = Some(totals);
    }

    let lines: Vec<ReconciliationLine> = keyed
        .into_iter()
        .map(|(key, (system, external))| {
            let (system_revenue, system_commission) = system
                .map(|s| (s.total_revenue, s.total_commission))
                .unwrap_or_default();
            let (expected_revenue, expected_commission) = external
                .map(|e| (e.total_revenue, e.total_commission))
                .unwrap_or_default();

            let status = match (system, external) {
                (None, _) => ReconciliationStatus::MissingInSystem,
                (_, None) => ReconciliationStatus::MissingExpected,
                _ if (system_revenue - expected_revenue).abs() > tolerance
                    || (system_commission - expected_commission).abs() > tolerance =>
                {
                    ReconciliationStatus::Mismatch
                }
                _ => ReconciliationStatus::Matched,
            };

            ReconciliationLine {
                key,
                system_revenue,
                expected_revenue,
                system_commission,
                expected_commission,
                status,
            }
        })
        .collect();

    let report = ReconciliationReport { lines };
    for line in report.discrepancies() {
        warn!(
            key = %line.key,
            status = ?line.status,
            commission_delta = %line.commission_delta(),
            revenue_delta = %line.revenue_delta(),
            "reconciliation discrepancy"
        );
    }
    info!(
        lines = report.lines.len(),
        discrepancies = report.discrepancies().count(),
        "reconciliation complete"
    );
    report
}

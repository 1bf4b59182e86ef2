//! Commission trigger surface.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::attainment::{BonusPlan, BucketConfig, BucketResult, GoalMetrics, PlanResult};
use crate::entry::{CommissionEntryBuilder, CustomerTerms, EntryChange};
use crate::error::{EngineError, Result};
use crate::interfaces::{CommissionStore, ReferenceData};
use crate::model::{
    AuditRecord, CommissionEntry, CommissionMonth, EntryId, MonthlyCommissionSummary, Order,
    OrderId, RepId, RepTitle, SummaryKey,
};
use crate::rates::{CommissionRateResolver, RateTable, ResolvedRate};
use crate::services::reconciliation::{reconcile, ExpectedTotals, ReconciliationReport};
use crate::summary::MonthlySummaryRecalculator;
use crate::utils::KeyLocks;

/// An order with everything needed to build its entry.
struct PreparedOrder {
    order: Order,
    terms: CustomerTerms,
    resolved: ResolvedRate,
}

/// Result of a bulk recalculation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub entries: Vec<CommissionEntry>,
    pub summaries: Vec<MonthlyCommissionSummary>,
}

/// Runs commission operations against a store.
///
/// Every entry mutation and the recalculation of the summaries it touches run
/// under the lock for the affected (rep, month) keys, so a summary never mixes
/// pre- and post-mutation entries. Configuration errors are raised before
/// anything is written.
pub struct CommissionService {
    store: Arc<dyn CommissionStore>,
    reference: Arc<dyn ReferenceData>,
    rates: Arc<RateTable>,
    bonus: Arc<BonusPlan>,
    max_batch_size: usize,
    locks: KeyLocks,
}

impl CommissionService {
    pub fn new(
        store: Arc<dyn CommissionStore>,
        reference: Arc<dyn ReferenceData>,
        rates: Arc<RateTable>,
        bonus: Arc<BonusPlan>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            store,
            reference,
            rates,
            bonus,
            max_batch_size: max_batch_size.max(1),
            locks: KeyLocks::new(),
        }
    }

    /// Build or rebuild the entry for one order, then refresh its summary.
    pub async fn recalculate_entry(&self, order_id: &OrderId) -> Result<CommissionEntry> {
        let prepared = self.prepare(order_id).await?;
        let mut outcome = self.apply_prepared(vec![prepared]).await?;
        outcome
            .entries
            .pop()
            .ok_or_else(|| EngineError::OrderNotFound(order_id.clone()))
    }

    /// Build or rebuild entries for many orders.
    ///
    /// Every order is resolved before anything is written, so one
    /// misconfigured rate fails the whole batch. Entries are written in
    /// chunks of the configured batch size and each affected summary is
    /// recalculated once.
    pub async fn recalculate_orders(&self, order_ids: &[OrderId]) -> Result<BatchOutcome> {
        let mut seen = HashSet::new();
        let mut prepared = Vec::new();
        for order_id in order_ids {
            if seen.insert(order_id) {
                prepared.push(self.prepare(order_id).await?);
            }
        }
        self.apply_prepared(prepared).await
    }

    /// Toggle exclusion. The stored amount is never changed.
    pub async fn set_exclusion(
        &self,
        entry_id: EntryId,
        excluded: bool,
        reason: &str,
    ) -> Result<CommissionEntry> {
        let entry = self
            .mutate(entry_id, |existing| {
                Ok(CommissionEntryBuilder::set_exclusion(
                    existing,
                    excluded,
                    reason,
                    Utc::now(),
                ))
            })
            .await?;
        info!(%entry_id, excluded, "exclusion updated");
        Ok(entry)
    }

    /// Force a rate on an entry. A non-empty comment is required.
    pub async fn set_override(
        &self,
        entry_id: EntryId,
        rate: Decimal,
        comment: &str,
    ) -> Result<CommissionEntry> {
        let entry = self
            .mutate(entry_id, |existing| {
                CommissionEntryBuilder::apply_override(existing, rate, comment, Utc::now())
            })
            .await
            .inspect_err(|e| warn!(%entry_id, error = %e, "override rejected"))?;
        info!(%entry_id, %rate, "rate overridden");
        Ok(entry)
    }

    /// Drop an override and restore the original rate.
    pub async fn clear_override(&self, entry_id: EntryId, reason: &str) -> Result<CommissionEntry> {
        let entry = self
            .mutate(entry_id, |existing| {
                CommissionEntryBuilder::clear_override(existing, reason, Utc::now())
            })
            .await?;
        info!(%entry_id, rate = %entry.commission_rate(), "override cleared");
        Ok(entry)
    }

    /// Move an entry between commission months and refresh both summaries.
    pub async fn move_entry(
        &self,
        entry_id: EntryId,
        from: CommissionMonth,
        to: CommissionMonth,
        reason: &str,
    ) -> Result<CommissionEntry> {
        if from == to {
            warn!(%entry_id, month = %to, "move to same month rejected");
            return Err(EngineError::SameMonthMove { month: to });
        }

        let rep_id = self.load_entry(entry_id).await?.rep_id().clone();
        let from_key = SummaryKey::new(rep_id.clone(), from);
        let to_key = SummaryKey::new(rep_id, to);
        let _guards = self.locks.lock_all([&from_key, &to_key]).await;

        let existing = self.load_entry(entry_id).await?;
        let change = CommissionEntryBuilder::move_month(&existing, from, to, reason, Utc::now())
            .inspect_err(|e| warn!(%entry_id, error = %e, "move rejected"))?;
        let keys = BTreeSet::from([from_key, to_key]);
        self.commit(std::slice::from_ref(&change), &keys).await?;

        info!(%entry_id, %from, %to, "entry moved");
        Ok(change.entry)
    }

    /// Rebuild and store the summary for (rep, month).
    pub async fn recalculate_summary(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<MonthlyCommissionSummary> {
        let key = SummaryKey::new(rep_id.clone(), month);
        let _guard = self.locks.lock(&key).await;
        self.write_summary(&key).await
    }

    pub async fn summary(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Option<MonthlyCommissionSummary>> {
        Ok(self.store.get_summary(rep_id, month).await?)
    }

    /// Reconcile every stored summary for `month` against external figures.
    /// Expected totals for other months are ignored.
    pub async fn reconcile_month(
        &self,
        month: CommissionMonth,
        expected: &[ExpectedTotals],
        tolerance: Decimal,
    ) -> Result<ReconciliationReport> {
        let summaries = self.store.list_summaries(month).await?;
        let expected: Vec<ExpectedTotals> = expected
            .iter()
            .filter(|e| e.commission_month == month)
            .cloned()
            .collect();
        Ok(reconcile(&summaries, &expected, tolerance))
    }

    pub async fn audit_trail(&self, entry_id: EntryId) -> Result<Vec<AuditRecord>> {
        Ok(self.store.audit_trail(entry_id).await?)
    }

    /// Evaluate one bucket for a rep of `title`.
    ///
    /// The bucket is validated first; a bad sub-weight split is a
    /// configuration error, not a zero payout.
    pub fn evaluate_bucket(
        &self,
        bucket: &BucketConfig,
        title: RepTitle,
        metrics: &GoalMetrics,
    ) -> Result<BucketResult> {
        bucket.validate()?;
        let max_bonus = self.bonus.max_bonus(title)?;
        let result = self.bonus.engine().evaluate_bucket(bucket, max_bonus, metrics);
        debug!(bucket = %bucket.name, %title, payout = %result.payout, "bucket evaluated");
        Ok(result)
    }

    /// Evaluate every configured bucket for a rep of `title`.
    pub fn evaluate_plan(&self, title: RepTitle, metrics: &GoalMetrics) -> Result<PlanResult> {
        let result = self.bonus.evaluate(title, metrics)?;
        info!(%title, total = %result.total_payout, "bonus plan evaluated");
        Ok(result)
    }

    async fn load_entry(&self, entry_id: EntryId) -> Result<CommissionEntry> {
        self.store
            .get_entry(entry_id)
            .await?
            .ok_or(EngineError::EntryNotFound(entry_id))
    }

    /// Apply `f` to an entry under its key lock and commit it with the
    /// refreshed summary.
    async fn mutate<F>(&self, entry_id: EntryId, f: F) -> Result<CommissionEntry>
    where
        F: FnOnce(&CommissionEntry) -> Result<EntryChange>,
    {
        // The month can change between the unlocked read and taking the lock.
        let (existing, key, _guard) = loop {
            let key = self.load_entry(entry_id).await?.summary_key();
            let guard = self.locks.lock(&key).await;
            let existing = self.load_entry(entry_id).await?;
            if existing.summary_key() == key {
                break (existing, key, guard);
            }
        };

        let change = f(&existing)?;
        let keys = BTreeSet::from([key]);
        self.commit(std::slice::from_ref(&change), &keys).await?;
        Ok(change.entry)
    }

    /// Load the order, customer and rep and resolve the rate.
    async fn prepare(&self, order_id: &OrderId) -> Result<PreparedOrder> {
        let order = self
            .reference
            .order(order_id)
            .await?
            .ok_or_else(|| EngineError::OrderNotFound(order_id.clone()))?;
        let customer = self
            .reference
            .customer(&order.customer_id)
            .await?
            .ok_or_else(|| EngineError::CustomerNotFound(order.customer_id.clone()))?;
        let rep = self
            .reference
            .rep(&order.rep_id)
            .await?
            .ok_or_else(|| EngineError::RepNotFound(order.rep_id.clone()))?;

        let status = customer
            .status_as_of(&order.rep_id, order.posted_on)
            .ok_or_else(|| EngineError::RelationshipUnknown {
                customer_id: customer.id.clone(),
                rep_id: order.rep_id.clone(),
                date: order.posted_on,
            })?;
        let terms = CustomerTerms {
            segment: customer.segment,
            status,
        };
        let resolved =
            CommissionRateResolver::new(&self.rates).resolve(rep.title, terms.segment, status)?;

        Ok(PreparedOrder {
            order,
            terms,
            resolved,
        })
    }

    /// Lock, build or recalculate, then commit entries and touched summaries.
    async fn apply_prepared(&self, prepared: Vec<PreparedOrder>) -> Result<BatchOutcome> {
        if prepared.is_empty() {
            return Ok(BatchOutcome {
                entries: Vec::new(),
                summaries: Vec::new(),
            });
        }

        let (changes, keys, _guards) = loop {
            let mut keys = BTreeSet::new();
            for p in &prepared {
                keys.insert(self.target_key(p).await?);
            }
            let guards = self.locks.lock_all(&keys).await;

            let mut changes = Vec::with_capacity(prepared.len());
            let mut stable = true;
            for p in &prepared {
                let change = self.change_for(p).await?;
                if !keys.contains(&change.entry.summary_key()) {
                    stable = false;
                    break;
                }
                changes.push(change);
            }
            if stable {
                break (changes, keys, guards);
            }
        };

        let summaries = self.commit(&changes, &keys).await?;

        info!(
            entries = changes.len(),
            summaries = summaries.len(),
            version = %self.rates.version(),
            "entries recalculated"
        );
        Ok(BatchOutcome {
            entries: changes.into_iter().map(|c| c.entry).collect(),
            summaries,
        })
    }

    /// Key the order's entry lives under: its current month if it exists,
    /// otherwise the posting month.
    async fn target_key(&self, p: &PreparedOrder) -> Result<SummaryKey> {
        let existing = self.store.find_entry(&p.order.id, &p.order.rep_id).await?;
        Ok(match existing {
            Some(entry) => entry.summary_key(),
            None => SummaryKey::new(
                p.order.rep_id.clone(),
                CommissionMonth::of_date(p.order.posted_on),
            ),
        })
    }

    async fn change_for(&self, p: &PreparedOrder) -> Result<EntryChange> {
        let now = Utc::now();
        let existing = self.store.find_entry(&p.order.id, &p.order.rep_id).await?;
        Ok(match existing {
            Some(entry) => {
                CommissionEntryBuilder::recalculate(&entry, &p.order, p.terms, &p.resolved, now)
            }
            None => CommissionEntryBuilder::build(&p.order, p.terms, &p.resolved, now),
        })
    }

    /// Summaries for `keys` as they will be once `changes` are stored.
    /// Caller holds the locks for every key.
    async fn summaries_after(
        &self,
        keys: &BTreeSet<SummaryKey>,
        changes: &[EntryChange],
    ) -> Result<Vec<MonthlyCommissionSummary>> {
        let changed: HashSet<EntryId> = changes.iter().map(|c| c.entry.id()).collect();
        let now = Utc::now();
        let mut summaries = Vec::with_capacity(keys.len());
        for key in keys {
            let mut entries: Vec<CommissionEntry> = self
                .store
                .list_entries(&key.rep_id, key.month)
                .await?
                .into_iter()
                .filter(|e| !changed.contains(&e.id()))
                .collect();
            entries.extend(
                changes
                    .iter()
                    .filter(|c| &c.entry.summary_key() == key)
                    .map(|c| c.entry.clone()),
            );
            summaries.push(MonthlySummaryRecalculator::summarize(key, &entries, now));
        }
        Ok(summaries)
    }

    /// Store `changes` and the recalculated summaries for `keys` atomically.
    async fn commit(
        &self,
        changes: &[EntryChange],
        keys: &BTreeSet<SummaryKey>,
    ) -> Result<Vec<MonthlyCommissionSummary>> {
        let summaries = self.summaries_after(keys, changes).await?;
        let pairs: Vec<(CommissionEntry, AuditRecord)> = changes
            .iter()
            .map(|c| (c.entry.clone(), c.audit.clone()))
            .collect();
        self.store
            .apply_changes(&pairs, &summaries, self.max_batch_size)
            .await?;
        for summary in &summaries {
            log_summary(summary);
        }
        Ok(summaries)
    }

    /// Full-replace the summary for `key` from stored entries. Caller holds
    /// the key lock.
    async fn write_summary(&self, key: &SummaryKey) -> Result<MonthlyCommissionSummary> {
        let entries = self.store.list_entries(&key.rep_id, key.month).await?;
        let summary = MonthlySummaryRecalculator::summarize(key, &entries, Utc::now());
        self.store.replace_summary(&summary).await?;
        log_summary(&summary);
        Ok(summary)
    }
}

fn log_summary(summary: &MonthlyCommissionSummary) {
    info!(
        rep_id = %summary.rep_id,
        month = %summary.commission_month,
        orders = summary.total_orders,
        commission = %summary.total_commission,
        "summary recalculated"
    );
}

//! Mock CommissionStore implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::interfaces::{CommissionStore, Result, StorageError};
use crate::model::{
    AuditRecord, CommissionEntry, CommissionMonth, EntryId, MonthlyCommissionSummary, RepId,
    SummaryKey,
};

#[derive(Default, Clone)]
struct State {
    entries: HashMap<EntryId, CommissionEntry>,
    audit: HashMap<EntryId, Vec<AuditRecord>>,
    summaries: HashMap<SummaryKey, MonthlyCommissionSummary>,
}

/// Mock commission store that keeps everything in memory.
#[derive(Default)]
pub struct MockCommissionStore {
    state: RwLock<State>,
    fail_on_write: RwLock<bool>,
    fail_on_summary_write: RwLock<bool>,
    batches_written: RwLock<usize>,
}

impl MockCommissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `Unavailable`.
    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    /// Make every subsequent summary write fail with `Unavailable`.
    pub async fn set_fail_on_summary_write(&self, fail: bool) {
        *self.fail_on_summary_write.write().await = fail;
    }

    /// Number of committed entry chunks.
    pub async fn batches_written(&self) -> usize {
        *self.batches_written.read().await
    }

    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }

    async fn check_writable(&self) -> Result<()> {
        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable("mock write failure".to_string()));
        }
        Ok(())
    }

    async fn check_summary_writable(&self) -> Result<()> {
        self.check_writable().await?;
        if *self.fail_on_summary_write.read().await {
            return Err(StorageError::Unavailable(
                "mock summary write failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CommissionStore for MockCommissionStore {
    async fn get_entry(&self, id: EntryId) -> Result<Option<CommissionEntry>> {
        Ok(self.state.read().await.entries.get(&id).cloned())
    }

    async fn apply_changes(
        &self,
        changes: &[(CommissionEntry, AuditRecord)],
        summaries: &[MonthlyCommissionSummary],
        max_batch_size: usize,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let mut batches = 0;

        for chunk in changes.chunks(max_batch_size.max(1)) {
            self.check_writable().await?;
            for (entry, audit) in chunk {
                staged.entries.insert(entry.id(), entry.clone());
                staged.audit.entry(entry.id()).or_default().push(audit.clone());
            }
            batches += 1;
        }
        for summary in summaries {
            self.check_summary_writable().await?;
            staged.summaries.insert(summary.key(), summary.clone());
        }

        *state = staged;
        *self.batches_written.write().await += batches;
        Ok(())
    }

    async fn list_entries(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Vec<CommissionEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<CommissionEntry> = state
            .entries
            .values()
            .filter(|e| e.rep_id() == rep_id && e.commission_month() == month)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.order_id().cmp(b.order_id()));
        Ok(entries)
    }

    async fn audit_trail(&self, id: EntryId) -> Result<Vec<AuditRecord>> {
        Ok(self
            .state
            .read()
            .await
            .audit
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_summary(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Option<MonthlyCommissionSummary>> {
        let key = SummaryKey::new(rep_id.clone(), month);
        Ok(self.state.read().await.summaries.get(&key).cloned())
    }

    async fn replace_summary(&self, summary: &MonthlyCommissionSummary) -> Result<()> {
        self.check_summary_writable().await?;
        self.state
            .write()
            .await
            .summaries
            .insert(summary.key(), summary.clone());
        Ok(())
    }

    async fn list_summaries(
        &self,
        month: CommissionMonth,
    ) -> Result<Vec<MonthlyCommissionSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<MonthlyCommissionSummary> = state
            .summaries
            .values()
            .filter(|s| s.commission_month == month)
            .cloned()
            .collect();
        summaries.sort_by(|a, b| a.rep_id.cmp(&b.rep_id));
        Ok(summaries)
    }
}

//! Commission storage interface.

use async_trait::async_trait;

use crate::model::{
    AuditRecord, CommissionEntry, CommissionMonth, EntryId, MonthlyCommissionSummary, OrderId,
    RepId,
};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Corrupt value in column {field}: {value}")]
    Corrupt { field: &'static str, value: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Interface for commission persistence.
///
/// Entries are keyed by their stable [`EntryId`]; summaries by
/// (rep, commission month). Summary writes are full replacements.
///
/// Implementations:
/// - `MockCommissionStore`: in-memory storage
/// - `SqliteCommissionStore`: SQLite storage (feature `sqlite`)
#[async_trait]
pub trait CommissionStore: Send + Sync {
    /// Retrieve an entry by id.
    async fn get_entry(&self, id: EntryId) -> Result<Option<CommissionEntry>>;

    /// Retrieve the entry for an (order, rep) pair, if one has been created.
    async fn find_entry(
        &self,
        order_id: &OrderId,
        rep_id: &RepId,
    ) -> Result<Option<CommissionEntry>> {
        self.get_entry(EntryId::for_order(order_id, rep_id)).await
    }

    /// Insert or replace an entry together with its audit record.
    async fn put_entry(&self, entry: &CommissionEntry, audit: &AuditRecord) -> Result<()> {
        self.apply_changes(&[(entry.clone(), audit.clone())], &[], 1).await
    }

    /// Insert or replace entries with their audit records and replace the
    /// given summaries, all in one atomic unit.
    ///
    /// Entries are written in chunks of at most `max_batch_size`. If any
    /// chunk or summary fails nothing is kept, so stored summaries never
    /// disagree with stored entries.
    async fn apply_changes(
        &self,
        changes: &[(CommissionEntry, AuditRecord)],
        summaries: &[MonthlyCommissionSummary],
        max_batch_size: usize,
    ) -> Result<()>;

    /// All entries (excluded included) currently in a (rep, month).
    async fn list_entries(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Vec<CommissionEntry>>;

    /// Audit trail for an entry, oldest first.
    async fn audit_trail(&self, id: EntryId) -> Result<Vec<AuditRecord>>;

    /// Retrieve the stored summary for a (rep, month).
    async fn get_summary(
        &self,
        rep_id: &RepId,
        month: CommissionMonth,
    ) -> Result<Option<MonthlyCommissionSummary>>;

    /// Replace the summary for its (rep, month). Never merges fields.
    async fn replace_summary(&self, summary: &MonthlyCommissionSummary) -> Result<()>;

    /// List stored summaries for a month across reps.
    async fn list_summaries(
        &self,
        month: CommissionMonth,
    ) -> Result<Vec<MonthlyCommissionSummary>>;
}

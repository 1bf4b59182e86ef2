//! Engine error taxonomy.
//!
//! Configuration and validation errors are never defaulted away: each
//! message names the missing rate tuple or the offending field so an operator
//! can fix the rate table or resubmit without reading logs.

use rust_decimal::Decimal;

use crate::interfaces::StorageError;
use crate::model::{
    CommissionMonth, CustomerId, EntryId, OrderId, RelationshipStatus, RepId, RepTitle, Segment,
};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Broad class of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal: the rate table or bonus plan must be fixed.
    Configuration,
    /// Rejected input; nothing was written.
    Validation,
    /// A referenced record does not exist.
    NotFound,
    /// The store adapter failed.
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(
        "No commission rate configured for title '{title}', segment '{segment}', status '{status}'"
    )]
    RateNotConfigured {
        title: RepTitle,
        segment: Segment,
        status: RelationshipStatus,
    },

    #[error("Sub-goal weights in bucket '{bucket}' sum to {sum}, expected 1.0")]
    SubWeightsInvalid { bucket: String, sum: Decimal },

    #[error("Bucket weights sum to {sum}, expected 1.0")]
    BucketWeightsInvalid { sum: Decimal },

    #[error("Weight {weight} for '{name}' is outside 0..=1")]
    WeightOutOfRange { name: String, weight: Decimal },

    #[error("Rate {rate} for title '{title}' is outside 0..=100")]
    RateOutOfRange { title: RepTitle, rate: Decimal },

    #[error("Duplicate rate row for {0}")]
    DuplicateRate(String),

    #[error("Bonus goal '{0}' is configured more than once")]
    DuplicateGoal(String),

    #[error(
        "Rate row for title '{title}' has no segment but status '{status}'; \
         only transferred rows may omit the segment"
    )]
    SegmentRequired {
        title: RepTitle,
        status: RelationshipStatus,
    },

    #[error("Rate table version {version} is incomplete: missing {missing:?}")]
    RateTableIncomplete {
        version: String,
        missing: Vec<String>,
    },

    #[error("No maximum bonus configured for title '{0}'")]
    MaxBonusNotConfigured(RepTitle),

    #[error("Attainment floor {min} must be below cap {max}")]
    InvalidAttainmentBounds { min: Decimal, max: Decimal },

    #[error("Override on entry {entry_id} requires a non-empty rate comment")]
    OverrideCommentRequired { entry_id: EntryId },

    #[error("Override rate {rate} is outside 0..=100")]
    OverrideRateOutOfRange { rate: Decimal },

    #[error("Entry {entry_id} has no override to clear")]
    NoOverride { entry_id: EntryId },

    #[error("Entry is already in commission month {month}")]
    SameMonthMove { month: CommissionMonth },

    #[error("Entry {entry_id} is in {actual}, not {expected}")]
    MonthMismatch {
        entry_id: EntryId,
        expected: CommissionMonth,
        actual: CommissionMonth,
    },

    #[error("Customer {customer_id} has no relationship status with rep {rep_id} on {date}")]
    RelationshipUnknown {
        customer_id: CustomerId,
        rep_id: RepId,
        date: chrono::NaiveDate,
    },

    #[error("Commission entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Rep not found: {0}")]
    RepNotFound(RepId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::RateNotConfigured { .. }
            | EngineError::SubWeightsInvalid { .. }
            | EngineError::BucketWeightsInvalid { .. }
            | EngineError::WeightOutOfRange { .. }
            | EngineError::RateOutOfRange { .. }
            | EngineError::DuplicateRate(_)
            | EngineError::DuplicateGoal(_)
            | EngineError::SegmentRequired { .. }
            | EngineError::RateTableIncomplete { .. }
            | EngineError::MaxBonusNotConfigured(_)
            | EngineError::InvalidAttainmentBounds { .. }
            | EngineError::RelationshipUnknown { .. } => ErrorKind::Configuration,
            EngineError::OverrideCommentRequired { .. }
            | EngineError::OverrideRateOutOfRange { .. }
            | EngineError::NoOverride { .. }
            | EngineError::SameMonthMove { .. }
            | EngineError::MonthMismatch { .. } => ErrorKind::Validation,
            EngineError::EntryNotFound(_)
            | EngineError::OrderNotFound(_)
            | EngineError::CustomerNotFound(_)
            | EngineError::RepNotFound(_) => ErrorKind::NotFound,
            EngineError::Storage(_) => ErrorKind::Storage,
        }
    }
}

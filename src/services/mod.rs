//! Engine services.
//!
//! - `CommissionService`: the trigger surface for entry mutations and
//!   summary recalculation, serialized per (rep, month)
//! - `reconciliation`: compares stored monthly totals against externally
//!   maintained figures

mod commission;
pub mod reconciliation;

pub use commission::{BatchOutcome, CommissionService};
pub use reconciliation::{
    reconcile, ExpectedTotals, ReconciliationLine, ReconciliationReport, ReconciliationStatus,
};

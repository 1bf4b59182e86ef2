//! Abstract interfaces for the commission engine.
//!
//! These traits define the data-store contract:
//! - Commission storage (entries, audit trail, monthly summaries)
//! - Reference data (orders, customers, reps) produced by the import process

pub mod commission_store;
pub mod reference_data;

pub use commission_store::{CommissionStore, Result, StorageError};
pub use reference_data::ReferenceData;

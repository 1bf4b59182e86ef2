//! In-memory storage implementations.
//!
//! Used for tests and for the `memory` storage type. State lives behind a
//! single lock per store so that multi-record writes are atomic.

mod commission_store;
mod reference_data;

pub use commission_store::MockCommissionStore;
pub use reference_data::MockReferenceData;

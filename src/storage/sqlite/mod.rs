//! SQLite implementation of the commission store.

mod commission_store;

pub use commission_store::SqliteCommissionStore;

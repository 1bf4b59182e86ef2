//! Shared utilities.

pub mod bootstrap;
pub mod key_locks;
pub mod retry;

pub use key_locks::KeyLocks;

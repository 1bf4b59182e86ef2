//! Shared storage integration tests.
//!
//! Tests the CommissionStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod commission_store_tests;

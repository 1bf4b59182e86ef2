//! Commission engine
//!
//! Computes sales commission entries from imported orders, keeps per-rep
//! monthly summaries consistent with those entries, and evaluates quarterly
//! bonus payouts from weighted goal buckets.
//!
//! The pure pieces (`revenue`, `rates`, `entry`, `summary`, `attainment`)
//! take all inputs as values. `services::CommissionService` wires them to a
//! [`interfaces::CommissionStore`] and serializes work per (rep, month).

pub mod attainment;
pub mod config;
pub mod entry;
pub mod error;
pub mod interfaces;
pub mod model;
pub mod rates;
pub mod revenue;
pub mod services;
pub mod storage;
pub mod summary;
pub mod utils;

pub use error::{EngineError, ErrorKind, Result};

//! commission-recalc: re-run summary recalculation for one (rep, month)
//!
//! Reads every commission entry for the key from the configured store,
//! rebuilds the monthly summary as a full replacement, writes it back and
//! prints it as JSON.
//!
//! ## Usage
//! ```text
//! commission-recalc <rep_id> <YYYY-MM>
//! ```
//!
//! ## Configuration
//! - COMMISSION_CONFIG: Path to the YAML configuration file (optional)
//! - COMMISSION_LOG: Log filter (default: info)
//!
//! The rate table and bonus plan are validated on startup so a broken
//! configuration is reported even though this tool does not resolve rates.
//!
//! ## Concurrency
//! Per-(rep, month) locks live inside a running `CommissionService` and are
//! not shared across processes. Run this tool only while no service is
//! writing to the same store, or a summary written here can be overtaken by
//! an entry change committed in between the read and the write.

use chrono::Utc;
use tracing::info;

use commission_engine::config::Config;
use commission_engine::model::{CommissionMonth, RepId, SummaryKey};
use commission_engine::storage::init_storage;
use commission_engine::summary::MonthlySummaryRecalculator;
use commission_engine::utils::bootstrap::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let (rep_id, month) = match (args.next(), args.next()) {
        (Some(rep_id), Some(month)) => (RepId::new(rep_id), month.parse::<CommissionMonth>()?),
        _ => return Err("usage: commission-recalc <rep_id> <YYYY-MM>".into()),
    };

    let config = Config::load(None)?;
    let rates = config.rate_table()?;
    config.bonus_plan()?;
    info!(
        version = %rates.version(),
        storage = %config.storage.storage_type,
        "configuration loaded"
    );

    let store = init_storage(&config.storage).await?;
    let key = SummaryKey::new(rep_id, month);
    let entries = store.list_entries(&key.rep_id, key.month).await?;
    let summary = MonthlySummaryRecalculator::summarize(&key, &entries, Utc::now());
    store.replace_summary(&summary).await?;

    info!(key = %key, orders = summary.total_orders, "summary replaced");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

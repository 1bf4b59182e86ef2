//! Acceptance tests for the commission engine using Cucumber.
//!
//! ```bash
//! cargo test --test acceptance
//! ```

mod steps;

use cucumber::writer::Stats as _;
use cucumber::World;
use steps::attainment::AttainmentWorld;
use steps::commission::CommissionWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Commission Acceptance Tests ===\n");
    let commission = CommissionWorld::cucumber()
        .fail_on_skipped()
        .run("tests/acceptance/features/commission.feature")
        .await;

    println!("\n=== Running Attainment Acceptance Tests ===\n");
    let attainment = AttainmentWorld::cucumber()
        .fail_on_skipped()
        .run("tests/acceptance/features/attainment.feature")
        .await;

    let failed: Vec<&str> = [
        ("commission", commission.execution_has_failed()),
        ("attainment", attainment.execution_has_failed()),
    ]
    .into_iter()
    .filter_map(|(suite, failed)| failed.then_some(suite))
    .collect();
    if !failed.is_empty() {
        eprintln!("acceptance suites failed: {}", failed.join(", "));
        std::process::exit(1);
    }
}

//! Attainment step definitions.

use cucumber::{gherkin::Step, given, then, when, World};
use rust_decimal::Decimal;

use commission_engine::attainment::{
    AttainmentEngine, BucketConfig, BucketResult, GoalActual, GoalMetrics, SubGoalConfig,
};
use commission_engine::EngineError;

use super::decimal;

/// Test context for bonus scenarios.
#[derive(Debug, Default, World)]
pub struct AttainmentWorld {
    max_bonus: Decimal,
    bucket: Option<BucketConfig>,
    metrics: GoalMetrics,
    setup_error: Option<EngineError>,
}

impl AttainmentWorld {
    fn evaluate(&self) -> BucketResult {
        let bucket = self.bucket.as_ref().expect("bucket configured");
        AttainmentEngine::default().evaluate_bucket(bucket, self.max_bonus, &self.metrics)
    }

    fn accept_bucket(&mut self, bucket: BucketConfig) {
        match bucket.validate() {
            Ok(()) => self.bucket = Some(bucket),
            Err(e) => self.setup_error = Some(e),
        }
    }
}

// --- Given steps ---

#[given(expr = "a maximum bonus of {string}")]
fn given_max_bonus(world: &mut AttainmentWorld, amount: String) {
    world.max_bonus = decimal(&amount);
}

#[given(expr = "a bucket {string} with weight {string}")]
fn given_bucket(world: &mut AttainmentWorld, name: String, weight: String) {
    world.accept_bucket(BucketConfig {
        name,
        weight: decimal(&weight),
        sub_goals: vec![],
    });
}

#[given(expr = "a bucket {string} with weight {string} split into:")]
fn given_split_bucket(world: &mut AttainmentWorld, step: &Step, name: String, weight: String) {
    let table = step.table.as_ref().expect("sub-goal rows");
    let sub_goals = table
        .rows
        .iter()
        .skip(1)
        .map(|row| SubGoalConfig {
            name: row[0].trim().to_string(),
            sub_weight: decimal(&row[1]),
        })
        .collect();
    world.accept_bucket(BucketConfig {
        name,
        weight: decimal(&weight),
        sub_goals,
    });
}

// --- When steps ---

#[when(expr = "the rep has goal {string} and actual {string} for {string}")]
fn when_goal_actual(world: &mut AttainmentWorld, goal: String, actual: String, name: String) {
    world
        .metrics
        .insert(name, GoalActual::new(decimal(&goal), decimal(&actual)));
}

// --- Then steps ---

#[then(expr = "the attainment is {string}")]
fn then_attainment(world: &mut AttainmentWorld, expected: String) {
    let result = world.evaluate();
    assert_eq!(result.lines[0].1.attainment, decimal(&expected));
}

#[then(expr = "the bucket maximum is {string}")]
fn then_bucket_max(world: &mut AttainmentWorld, expected: String) {
    let result = world.evaluate();
    assert_eq!(result.lines[0].1.bucket_max, decimal(&expected));
}

#[then(expr = "the payout is {string}")]
fn then_payout(world: &mut AttainmentWorld, expected: String) {
    assert_eq!(world.evaluate().payout, decimal(&expected));
}

#[then(expr = "the bucket is rejected mentioning {string}")]
fn then_bucket_rejected(world: &mut AttainmentWorld, fragment: String) {
    assert!(world.bucket.is_none(), "bucket should not be accepted");
    let err = world.setup_error.as_ref().expect("setup error recorded");
    assert!(matches!(err, EngineError::SubWeightsInvalid { .. }));
    assert!(err.to_string().contains(&fragment));
}

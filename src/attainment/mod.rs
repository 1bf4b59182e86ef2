//! Quarterly bonus attainment.
//!
//! A bucket pays `capped_attainment * bucket_max`, where attainment below the
//! floor pays nothing at all (a cliff, not a ramp) and attainment above the
//! cap pays the cap. Payouts are exact; rounding is left to whoever renders
//! them.

mod plan;

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub use plan::{BonusConfig, BonusPlan, BucketConfig, PlanResult, SubGoalConfig};

/// Default attainment floor.
pub const DEFAULT_MIN_ATTAINMENT: Decimal = dec!(0.75);
/// Default attainment cap.
pub const DEFAULT_MAX_ATTAINMENT: Decimal = dec!(1.25);
/// Allowed drift when checking that weights sum to 1.0.
pub const WEIGHT_TOLERANCE: Decimal = dec!(0.0001);

/// Goal and actual value for one goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalActual {
    pub goal: Decimal,
    pub actual: Decimal,
}

impl GoalActual {
    pub fn new(goal: Decimal, actual: Decimal) -> Self {
        Self { goal, actual }
    }
}

/// Goal metrics keyed by goal name (bucket name, or sub-goal name for
/// split buckets).
pub type GoalMetrics = HashMap<String, GoalActual>;

/// Floor and cap on attainment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttainmentBounds {
    min: Decimal,
    max: Decimal,
}

impl AttainmentBounds {
    pub fn new(min: Decimal, max: Decimal) -> Result<Self> {
        if min < Decimal::ZERO || min >= max {
            return Err(EngineError::InvalidAttainmentBounds { min, max });
        }
        Ok(Self { min, max })
    }
}

impl Default for AttainmentBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ATTAINMENT,
            max: DEFAULT_MAX_ATTAINMENT,
        }
    }
}

/// Outcome for a single goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalPayout {
    pub attainment: Decimal,
    pub bucket_max: Decimal,
    pub payout: Decimal,
}

/// Outcome for a bucket: one line per goal, payouts summed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketResult {
    pub name: String,
    pub lines: Vec<(String, GoalPayout)>,
    pub payout: Decimal,
}

/// Pure bonus arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttainmentEngine {
    bounds: AttainmentBounds,
}

impl AttainmentEngine {
    pub fn new(bounds: AttainmentBounds) -> Self {
        Self { bounds }
    }

    /// `actual / goal`, or zero when the goal is zero.
    pub fn attainment(goal: Decimal, actual: Decimal) -> Decimal {
        if goal.is_zero() {
            Decimal::ZERO
        } else {
            actual / goal
        }
    }

    pub fn payout(
        &self,
        metric: GoalActual,
        max_bonus: Decimal,
        bucket_weight: Decimal,
        sub_weight: Option<Decimal>,
    ) -> GoalPayout {
        let attainment = Self::attainment(metric.goal, metric.actual);
        let bucket_max = max_bonus * bucket_weight * sub_weight.unwrap_or(Decimal::ONE);
        let capped = if attainment < self.bounds.min {
            Decimal::ZERO
        } else {
            attainment.min(self.bounds.max)
        };
        let payout = capped * bucket_max;

        GoalPayout {
            attainment,
            bucket_max,
            payout,
        }
    }

    /// Evaluate a validated bucket. Goals with no metric count as zero
    /// attainment.
    pub fn evaluate_bucket(
        &self,
        bucket: &BucketConfig,
        max_bonus: Decimal,
        metrics: &GoalMetrics,
    ) -> BucketResult {
        let metric = |name: &str| metrics.get(name).copied().unwrap_or_default();

        let lines: Vec<(String, GoalPayout)> = if bucket.sub_goals.is_empty() {
            vec![(
                bucket.name.clone(),
                self.payout(metric(&bucket.name), max_bonus, bucket.weight, None),
            )]
        } else {
            bucket
                .sub_goals
                .iter()
                .map(|sub| {
                    (
                        sub.name.clone(),
                        self.payout(
                            metric(&sub.name),
                            max_bonus,
                            bucket.weight,
                            Some(sub.sub_weight),
                        ),
                    )
                })
                .collect()
        };

        let payout = lines.iter().map(|(_, line)| line.payout).sum();
        BucketResult {
            name: bucket.name.clone(),
            lines,
            payout,
        }
    }
}

//! Bonus plan configuration and validation.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{
    AttainmentBounds, AttainmentEngine, BucketResult, GoalMetrics, DEFAULT_MAX_ATTAINMENT,
    DEFAULT_MIN_ATTAINMENT, WEIGHT_TOLERANCE,
};
use crate::error::{EngineError, Result};
use crate::model::RepTitle;

/// A sub-goal inside a split bucket (e.g. one product line of a mix goal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubGoalConfig {
    pub name: String,
    pub sub_weight: Decimal,
}

/// A weighted bonus bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    pub name: String,
    pub weight: Decimal,
    #[serde(default)]
    pub sub_goals: Vec<SubGoalConfig>,
}

impl BucketConfig {
    /// Setup-time checks: weights in range, sub-weights sum to 1.0.
    pub fn validate(&self) -> Result<()> {
        check_weight(&self.name, self.weight)?;
        if self.sub_goals.is_empty() {
            return Ok(());
        }

        for sub in &self.sub_goals {
            check_weight(&sub.name, sub.sub_weight)?;
        }
        let sum: Decimal = self.sub_goals.iter().map(|s| s.sub_weight).sum();
        if (sum - Decimal::ONE).abs() > WEIGHT_TOLERANCE {
            return Err(EngineError::SubWeightsInvalid {
                bucket: self.name.clone(),
                sum,
            });
        }
        Ok(())
    }

    fn goal_names(&self) -> Vec<&str> {
        if self.sub_goals.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.sub_goals.iter().map(|s| s.name.as_str()).collect()
        }
    }
}

fn check_weight(name: &str, weight: Decimal) -> Result<()> {
    if weight < Decimal::ZERO || weight > Decimal::ONE {
        return Err(EngineError::WeightOutOfRange {
            name: name.to_string(),
            weight,
        });
    }
    Ok(())
}

/// Bonus section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    pub min_attainment: Decimal,
    pub max_attainment: Decimal,
    /// Quarterly bonus ceiling per title.
    pub max_bonus: HashMap<RepTitle, Decimal>,
    pub buckets: Vec<BucketConfig>,
}

impl Default for BonusConfig {
    fn default() -> Self {
        Self {
            min_attainment: DEFAULT_MIN_ATTAINMENT,
            max_attainment: DEFAULT_MAX_ATTAINMENT,
            max_bonus: HashMap::new(),
            buckets: Vec::new(),
        }
    }
}

/// Result of evaluating a full plan for one rep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub title: RepTitle,
    pub max_bonus: Decimal,
    pub buckets: Vec<BucketResult>,
    pub total_payout: Decimal,
}

/// Validated quarterly bonus plan.
#[derive(Debug, Clone)]
pub struct BonusPlan {
    engine: AttainmentEngine,
    max_bonus: HashMap<RepTitle, Decimal>,
    buckets: Vec<BucketConfig>,
}

impl BonusPlan {
    /// Validate and build. Bucket weights must sum to 1.0 and every bucket's
    /// sub-weights must sum to 1.0, both within [`WEIGHT_TOLERANCE`].
    pub fn from_config(config: &BonusConfig) -> Result<Self> {
        let bounds = AttainmentBounds::new(config.min_attainment, config.max_attainment)?;

        let mut seen = HashSet::new();
        for bucket in &config.buckets {
            if let Err(e) = bucket.validate() {
                error!(bucket = %bucket.name, error = %e, "invalid bonus bucket");
                return Err(e);
            }
            for name in bucket.goal_names() {
                if !seen.insert(name) {
                    return Err(EngineError::DuplicateGoal(name.to_string()));
                }
            }
        }

        if !config.buckets.is_empty() {
            let sum: Decimal = config.buckets.iter().map(|b| b.weight).sum();
            if (sum - Decimal::ONE).abs() > WEIGHT_TOLERANCE {
                return Err(EngineError::BucketWeightsInvalid { sum });
            }
        }

        debug!(
            buckets = config.buckets.len(),
            titles = config.max_bonus.len(),
            "bonus plan validated"
        );
        Ok(Self {
            engine: AttainmentEngine::new(bounds),
            max_bonus: config.max_bonus.clone(),
            buckets: config.buckets.clone(),
        })
    }

    pub fn engine(&self) -> &AttainmentEngine {
        &self.engine
    }

    pub fn max_bonus(&self, title: RepTitle) -> Result<Decimal> {
        self.max_bonus
            .get(&title)
            .copied()
            .ok_or(EngineError::MaxBonusNotConfigured(title))
    }

    /// Evaluate every bucket for a rep of `title`.
    pub fn evaluate(&self, title: RepTitle, metrics: &GoalMetrics) -> Result<PlanResult> {
        let max_bonus = self.max_bonus(title)?;
        let buckets: Vec<BucketResult> = self
            .buckets
            .iter()
            .map(|bucket| self.engine.evaluate_bucket(bucket, max_bonus, metrics))
            .collect();
        let total_payout = buckets.iter().map(|b| b.payout).sum();

        Ok(PlanResult {
            title,
            max_bonus,
            buckets,
            total_payout,
        })
    }
}

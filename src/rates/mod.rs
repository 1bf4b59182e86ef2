//! Commission rate table and resolution.
//!
//! The table is an injected, versioned value. It is built once from
//! configuration, validated, and then passed by reference into the engine.

mod resolver;

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{RelationshipStatus, RepTitle, Segment};

pub use resolver::{CommissionRateResolver, RateTier, ResolvedRate};

/// One configured rate row.
///
/// `segment` may be omitted only for `transferred` rows; such a row is the
/// flat per-title fallback used when no segment-specific transferred rate
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateRow {
    pub title: RepTitle,
    #[serde(default)]
    pub segment: Option<Segment>,
    pub status: RelationshipStatus,
    pub rate: Decimal,
}

/// Serialized form of a rate table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTableConfig {
    pub version: String,
    pub rates: Vec<RateRow>,
}

type RateKey = (RepTitle, Segment, RelationshipStatus);

/// Validated lookup of commission percentage by (title, segment, status).
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    version: String,
    exact: HashMap<RateKey, Decimal>,
    transferred_flat: HashMap<RepTitle, Decimal>,
}

impl RateTable {
    /// Build a table from rows, rejecting out-of-range rates, duplicate
    /// rows, and segment-less rows for non-transferred status.
    pub fn from_rows(version: impl Into<String>, rows: &[RateRow]) -> Result<Self> {
        let mut exact = HashMap::new();
        let mut transferred_flat = HashMap::new();

        for row in rows {
            if row.rate < Decimal::ZERO || row.rate > Decimal::ONE_HUNDRED {
                return Err(EngineError::RateOutOfRange {
                    title: row.title,
                    rate: row.rate,
                });
            }
            match row.segment {
                Some(segment) => {
                    let key = (row.title, segment, row.status);
                    if exact.insert(key, row.rate).is_some() {
                        return Err(EngineError::DuplicateRate(format!(
                            "({}, {}, {})",
                            row.title, segment, row.status
                        )));
                    }
                }
                None if row.status == RelationshipStatus::Transferred => {
                    if transferred_flat.insert(row.title, row.rate).is_some() {
                        return Err(EngineError::DuplicateRate(format!(
                            "({}, *, transferred)",
                            row.title
                        )));
                    }
                }
                None => {
                    return Err(EngineError::SegmentRequired {
                        title: row.title,
                        status: row.status,
                    });
                }
            }
        }

        Ok(Self {
            version: version.into(),
            exact,
            transferred_flat,
        })
    }

    /// Build and coverage-check a table from its configuration.
    pub fn from_config(config: &RateTableConfig) -> Result<Self> {
        let table = Self::from_rows(config.version.clone(), &config.rates)?;
        table.validate_coverage()?;
        Ok(table)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub(crate) fn exact_rate(
        &self,
        title: RepTitle,
        segment: Segment,
        status: RelationshipStatus,
    ) -> Option<Decimal> {
        self.exact.get(&(title, segment, status)).copied()
    }

    pub(crate) fn transferred_rate(&self, title: RepTitle) -> Option<Decimal> {
        self.transferred_flat.get(&title).copied()
    }

    /// Every title must resolve for every (segment, status) combination.
    pub fn validate_coverage(&self) -> Result<()> {
        let resolver = CommissionRateResolver::new(self);
        let mut missing = Vec::new();

        for title in RepTitle::ALL {
            for segment in Segment::ALL {
                for status in RelationshipStatus::ALL {
                    if resolver.resolve(title, segment, status).is_err() {
                        missing.push(format!("({title}, {segment}, {status})"));
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::RateTableIncomplete {
                version: self.version.clone(),
                missing,
            })
        }
    }
}

//! Commission rate resolution.

use rust_decimal::Decimal;
use tracing::{debug, error};

use super::RateTable;
use crate::error::{EngineError, Result};
use crate::model::{RelationshipStatus, RepTitle, Segment};

/// Which tier of the table produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateTier {
    /// Exact (title, segment, status) row.
    Exact,
    /// Segment-less transferred row for the title.
    TransferredFlat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub rate: Decimal,
    pub tier: RateTier,
    pub rate_table_version: String,
}

/// Selects the applicable rate from a [`RateTable`].
///
/// Resolution order:
/// 1. exact (title, segment, status) row;
/// 2. for `transferred` only, the flat transferred row for the title;
/// 3. otherwise [`EngineError::RateNotConfigured`]. There is no default rate.
pub struct CommissionRateResolver<'a> {
    table: &'a RateTable,
}

impl<'a> CommissionRateResolver<'a> {
    pub fn new(table: &'a RateTable) -> Self {
        Self { table }
    }

    pub fn resolve(
        &self,
        title: RepTitle,
        segment: Segment,
        status: RelationshipStatus,
    ) -> Result<ResolvedRate> {
        if let Some(rate) = self.table.exact_rate(title, segment, status) {
            debug!(%title, %segment, %status, %rate, "rate resolved (exact)");
            return Ok(self.resolved(rate, RateTier::Exact));
        }

        if status == RelationshipStatus::Transferred {
            if let Some(rate) = self.table.transferred_rate(title) {
                debug!(%title, %segment, %rate, "rate resolved (transferred flat)");
                return Ok(self.resolved(rate, RateTier::TransferredFlat));
            }
        }

        error!(
            %title,
            %segment,
            %status,
            version = %self.table.version(),
            "rate not configured"
        );
        Err(EngineError::RateNotConfigured {
            title,
            segment,
            status,
        })
    }

    fn resolved(&self, rate: Decimal, tier: RateTier) -> ResolvedRate {
        ResolvedRate {
            rate,
            tier,
            rate_table_version: self.table.version().to_string(),
        }
    }
}

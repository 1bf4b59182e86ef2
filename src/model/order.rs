//! Read-only inputs produced by the external import process.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CustomerId, OrderId, RelationshipStatus, RepId, RepTitle, Segment};

/// A single order line. Positive amounts are sales, negative are returns/credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItem {
    pub amount: Decimal,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub is_shipping: bool,
    #[serde(default)]
    pub is_fee: bool,
}

impl LineItem {
    pub fn sale(amount: Decimal) -> Self {
        Self {
            amount,
            quantity: Decimal::ONE,
            is_shipping: false,
            is_fee: false,
        }
    }

    pub fn shipping(amount: Decimal) -> Self {
        Self {
            is_shipping: true,
            ..Self::sale(amount)
        }
    }

    pub fn fee(amount: Decimal) -> Self {
        Self {
            is_fee: true,
            ..Self::sale(amount)
        }
    }

    /// Whether this line contributes to the commission base.
    pub fn is_commissionable(&self) -> bool {
        !self.is_shipping && !self.is_fee
    }
}

/// A posted order with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub rep_id: RepId,
    pub posted_on: NaiveDate,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

/// A change in a customer's relationship with a rep, effective from a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChange {
    pub rep_id: RepId,
    pub status: RelationshipStatus,
    pub effective_from: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Customer {
    pub id: CustomerId,
    pub segment: Segment,
    #[serde(default)]
    pub relationship_history: Vec<StatusChange>,
}

impl Customer {
    /// Relationship status with `rep_id` in effect on `date`.
    ///
    /// Returns `None` when no status had been recorded for that rep by then.
    pub fn status_as_of(&self, rep_id: &RepId, date: NaiveDate) -> Option<RelationshipStatus> {
        self.relationship_history
            .iter()
            .filter(|change| &change.rep_id == rep_id && change.effective_from <= date)
            .max_by_key(|change| change.effective_from)
            .map(|change| change.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rep {
    pub id: RepId,
    #[serde(default)]
    pub name: String,
    pub title: RepTitle,
}

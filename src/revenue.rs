//! Commission-eligible revenue of an order.

use rust_decimal::Decimal;

use crate::model::LineItem;

/// Reduces an order's line items to its commission base.
///
/// Shipping and fee lines are dropped entirely; every other line is summed
/// with its sign, so returns and credits reduce the base. No rounding happens
/// here.
pub struct RevenueAggregator;

impl RevenueAggregator {
    pub fn order_revenue(line_items: &[LineItem]) -> Decimal {
        line_items
            .iter()
            .filter(|item| item.is_commissionable())
            .map(|item| item.amount)
            .sum()
    }
}

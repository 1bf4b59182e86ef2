//! Domain model.
//!
//! Inputs (orders, customers, reps) are fixed, validated structs; unknown
//! shapes are rejected by serde at the boundary before they reach the engine.
//! Persisted records (entries, audit, summaries) live in [`entry`].

mod entry;
mod month;
mod order;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use entry::{AuditAction, AuditRecord, CommissionEntry, MonthlyCommissionSummary, SummaryKey};
pub use month::{CommissionMonth, MonthParseError};
pub use order::{Customer, LineItem, Order, Rep, StatusChange};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// External order identifier (ERP order number).
    OrderId
);
string_id!(
    /// External customer identifier.
    CustomerId
);
string_id!(
    /// Sales rep identifier.
    RepId
);

/// Namespace for deterministic entry identifiers.
const ENTRY_NAMESPACE: Uuid = Uuid::from_u128(0x6c0f_3a8e_91d2_4b57_a0e4_52c9_7d18_e3b6);

/// Stable identifier of a commission entry.
///
/// Derived from (order, rep) so that recalculating an order always lands on
/// the same entry, whichever month the entry currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn for_order(order_id: &OrderId, rep_id: &RepId) -> Self {
        let name = format!("{}/{}", order_id.as_str(), rep_id.as_str());
        Self(Uuid::new_v5(&ENTRY_NAMESPACE, name.as_bytes()))
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rep title. Selects the rate table row and the bonus ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepTitle {
    AccountManager,
    AccountExecutive,
    #[serde(alias = "sr_account_executive")]
    SeniorAccountExecutive,
}

impl RepTitle {
    pub const ALL: [RepTitle; 3] = [
        RepTitle::AccountManager,
        RepTitle::AccountExecutive,
        RepTitle::SeniorAccountExecutive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepTitle::AccountManager => "Account Manager",
            RepTitle::AccountExecutive => "Account Executive",
            RepTitle::SeniorAccountExecutive => "Sr. Account Executive",
        }
    }
}

impl fmt::Display for RepTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer segment. There is deliberately no default variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Distributor,
    Wholesale,
    Retail,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Distributor, Segment::Wholesale, Segment::Retail];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Distributor => "distributor",
            Segment::Wholesale => "wholesale",
            Segment::Retail => "retail",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer relationship relative to the rep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    New,
    Maintained,
    Transferred,
}

impl RelationshipStatus {
    pub const ALL: [RelationshipStatus; 3] = [
        RelationshipStatus::New,
        RelationshipStatus::Maintained,
        RelationshipStatus::Transferred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::New => "new",
            RelationshipStatus::Maintained => "maintained",
            RelationshipStatus::Transferred => "transferred",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

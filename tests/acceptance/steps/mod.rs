//! Step definitions.

pub mod attainment;
pub mod commission;

use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a money or rate literal from a feature file.
pub fn decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or_else(|_| panic!("not a decimal: {raw}"))
}

/// Parse a snake_case enum literal from a feature file.
pub fn parse_enum<T: serde::de::DeserializeOwned>(raw: &str) -> T {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .unwrap_or_else(|_| panic!("unknown value: {raw}"))
}

//! Decimal type utilities for precise monetary values

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount (account balances, transfer amounts)
pub type Amount = Decimal;

/// Parse an amount from its textual form (configuration, CLI input)
pub fn parse_amount(raw: &str) -> crate::error::Result<Amount> {
    raw.trim().parse::<Amount>().map_err(Into::into)
}

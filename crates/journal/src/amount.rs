//! Decimal-to-minor-unit conversion.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use ledgerpost_core::{LedgerError, LedgerResult};

/// Convert a decimal amount to integer minor units at the currency's
/// precision. Exact only: fractional digits beyond the precision are a
/// validation error, never rounded away.
pub fn to_minor_units(amount: Decimal, decimals: u32) -> LedgerResult<i64> {
    let scale = 10u64
        .checked_pow(decimals)
        .map(Decimal::from)
        .ok_or_else(|| {
            LedgerError::validation(format!("currency precision {decimals} out of range"))
        })?;
    let scaled = amount
        .checked_mul(scale)
        .ok_or_else(|| LedgerError::validation(format!("amount {amount} out of range")))?;
    if scaled.fract() != Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "amount {amount} has more than {decimals} decimal places"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| LedgerError::validation(format!("amount {amount} out of range")))
}

//! Account-number codec.
//!
//! An account number is `<category code><entity code><sequence>`, with the
//! sequence zero-left-padded to exactly `pad_width` digits. Account numbers
//! are externally visible identifiers, so encoding must be bit-exact:
//! a sequence wider than `pad_width` is an overflow error, never a
//! truncation.

use crate::error::{LedgerError, LedgerResult};

/// Entity code used when a request carries none.
pub const DEFAULT_ENTITY_CODE: &str = "000";

/// Format an account number. Pure.
pub fn encode_account_number(
    category_code: &str,
    entity_code: Option<&str>,
    pad_width: u32,
    sequence: u64,
) -> LedgerResult<String> {
    let digits = sequence.to_string();
    let width = pad_width as usize;
    if digits.len() > width {
        return Err(LedgerError::invariant(format!(
            "sequence {sequence} overflows pad width {pad_width} for category {category_code}"
        )));
    }
    let entity = entity_code.unwrap_or(DEFAULT_ENTITY_CODE);
    Ok(format!("{category_code}{entity}{digits:0>width$}"))
}

/// Recover the sequence from an account number's padded suffix.
pub fn decode_sequence(account_number: &str, pad_width: u32) -> LedgerResult<u64> {
    let width = pad_width as usize;
    if account_number.len() < width {
        return Err(LedgerError::validation(format!(
            "account number '{account_number}' shorter than pad width {pad_width}"
        )));
    }
    let suffix = &account_number[account_number.len() - width..];
    suffix
        .parse::<u64>()
        .map_err(|e| LedgerError::validation(format!("bad sequence suffix '{suffix}': {e}")))
}

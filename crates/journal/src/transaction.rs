//! Journal transaction model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ledgerpost_core::{Classification, LedgerError, LedgerResult};

/// Fixed wire format for transaction and processing dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One inbound line item. Amounts are positive magnitudes; the debit flag
/// determines the sign of the persisted split amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub account_number: String,
    pub amount: Decimal,
    pub is_debit: bool,
    pub description: Option<String>,
}

/// Inbound journal posting request. The transaction id is caller-supplied
/// and must be new; re-submitting an id is a duplicate, not a correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRequest {
    pub transaction_id: String,
    pub reference_number: String,
    pub order_type: String,
    pub transaction_date: String,
    pub processing_date: String,
    pub currency: String,
    pub line_items: Vec<LineItem>,
}

/// Persisted transaction header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub transaction_id: String,
    pub reference_number: String,
    pub order_type: String,
    pub transaction_date: NaiveDate,
    pub processing_date: NaiveDate,
    pub currency: String,
    pub booked_at: DateTime<Utc>,
}

/// One ledger line derived from a line item. The split id is date-prefixed
/// and sequence-padded; the atomic sequence source makes collisions
/// impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub split_id: String,
    pub split_date: NaiveDate,
    pub description: String,
    pub currency: String,
    /// Signed minor units: debits positive, credits negative.
    pub amount_minor: i64,
    pub account_number: String,
    pub transaction_id: String,
}

/// Row linking a split to its account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAccountLink {
    pub split_id: String,
    pub account_number: String,
}

/// Denormalized record for downstream consumption. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalDetail {
    pub split_id: String,
    pub transaction_id: String,
    pub reference_number: String,
    pub account_number: String,
    pub classification: Classification,
    pub is_debit: bool,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub split_date: NaiveDate,
    pub booked_at: DateTime<Utc>,
}

/// Parse a wire date, rejecting malformed input.
pub fn parse_posting_date(raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| LedgerError::validation(format!("malformed date '{raw}': {e}")))
}

/// Reject dates strictly after the current day's end-of-day instant, i.e.
/// any date later than `today`.
pub fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> LedgerResult<()> {
    if date > today {
        return Err(LedgerError::validation(format!(
            "date {date} is after the current day's end of day"
        )));
    }
    Ok(())
}

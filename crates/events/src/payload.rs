//! Event payloads produced by the posting core.
//!
//! Every payload carries the full classification snapshot a consumer needs,
//! so no callback into this service is ever required.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use ledgerpost_core::Classification;

pub const TOPIC_ACCOUNTS: &str = "ledger.accounts";
pub const TOPIC_ACCOUNTS_DLQ: &str = "ledger.accounts.dlq";
pub const TOPIC_JOURNAL_ENTRIES: &str = "ledger.journal.entries";
pub const TOPIC_JOURNAL_ENTRIES_DLQ: &str = "ledger.journal.entries.dlq";

/// Emitted once per minted account (primary and satellites alike), keyed by
/// account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub event_id: Uuid,
    pub account_number: String,
    pub owner_id: String,
    pub account_type: Option<String>,
    pub classification: Classification,
    pub display_name: String,
    pub alternate_id: Option<String>,
    pub legacy_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Emitted after an explicit account mutation, keyed by account number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdated {
    pub event_id: Uuid,
    pub account_number: String,
    pub owner_id: String,
    pub classification: Classification,
    pub display_name: String,
    pub alternate_id: Option<String>,
    pub legacy_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized journal-detail record, keyed by split id. Immutable once
/// emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCreated {
    pub event_id: Uuid,
    pub split_id: String,
    pub transaction_id: String,
    pub reference_number: String,
    pub account_number: String,
    pub classification: Classification,
    pub is_debit: bool,
    /// Signed amount in minor units (debits positive, credits negative).
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub split_date: NaiveDate,
    pub booked_at: DateTime<Utc>,
}

/// Wrapper re-published to a dead-letter topic when normal delivery fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub event_id: Uuid,
    pub source_topic: String,
    pub key: String,
    /// Description of the error that prevented normal delivery.
    pub error: String,
    pub payload: JsonValue,
    pub occurred_at: DateTime<Utc>,
}

//! Collaborator contracts consumed by journal posting.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgerpost_core::{Classification, Currency, LedgerResult};

use crate::transaction::{JournalDetail, Split, SplitAccountLink, TransactionHeader};

/// Classification snapshot of one account, as posting needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_number: String,
    pub classification: Classification,
}

/// Read-only account resolution for posting.
pub trait AccountDirectory: Send + Sync {
    fn account_snapshot(&self, account_number: &str) -> LedgerResult<Option<AccountSnapshot>>;
}

/// Ledger-currency lookup (precision per currency).
pub trait CurrencySource: Send + Sync {
    fn currency(&self, code: &str) -> LedgerResult<Option<Currency>>;
}

/// One atomic unit of posting writes: header, splits, split-account links
/// and journal details. Partial writes are forbidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingBatch {
    pub transaction: TransactionHeader,
    pub splits: Vec<Split>,
    pub links: Vec<SplitAccountLink>,
    pub details: Vec<JournalDetail>,
}

/// Journal persistence collaborator. `persist_posting` must be
/// all-or-nothing; a failure leaves no row of the batch visible.
pub trait JournalStore: Send + Sync {
    fn transaction_exists(&self, transaction_id: &str) -> LedgerResult<bool>;

    fn persist_posting(&self, batch: &PostingBatch) -> LedgerResult<()>;
}

impl<S> JournalStore for Arc<S>
where
    S: JournalStore + ?Sized,
{
    fn transaction_exists(&self, transaction_id: &str) -> LedgerResult<bool> {
        (**self).transaction_exists(transaction_id)
    }

    fn persist_posting(&self, batch: &PostingBatch) -> LedgerResult<()> {
        (**self).persist_posting(batch)
    }
}

/// An open trial-balance reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalancePeriod {
    pub id: String,
    pub year: i32,
    pub month: u32,
    pub open: bool,
    pub last_adjusted_on: Option<NaiveDate>,
}

/// Trial-balance period lookups for the automatic adjustment side effect.
pub trait TrialBalanceStore: Send + Sync {
    /// The open period covering `year`/`month`, if any.
    fn open_period(&self, year: i32, month: u32) -> LedgerResult<Option<TrialBalancePeriod>>;

    /// Mark the period adjusted on `on`. Returns `false` when it was
    /// already marked for that day.
    fn mark_adjusted(&self, period_id: &str, on: NaiveDate) -> LedgerResult<bool>;
}

/// Asynchronous adjustment job, submitted fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentJob {
    pub period_id: String,
    pub year: i32,
    pub month: u32,
    pub transaction_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Task submission with its own error channel; the posting call never
/// awaits the job's outcome.
pub trait AdjustmentScheduler: Send + Sync {
    fn submit(&self, job: AdjustmentJob) -> LedgerResult<()>;
}

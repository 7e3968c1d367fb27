//! `ledgerpost-journal` — double-entry journal posting.
//!
//! Validates a journal request, expands it into balanced splits, persists
//! the whole posting atomically and emits entry-created events through the
//! publication gateway.

pub mod amount;
pub mod ports;
pub mod posting;
pub mod transaction;

pub use amount::to_minor_units;
pub use ports::{
    AccountDirectory, AccountSnapshot, AdjustmentJob, AdjustmentScheduler, CurrencySource,
    JournalStore, PostingBatch, TrialBalancePeriod, TrialBalanceStore,
};
pub use posting::{PostingEngine, TrialBalanceHook};
pub use transaction::{
    JournalDetail, JournalRequest, LineItem, Split, SplitAccountLink, TransactionHeader,
};

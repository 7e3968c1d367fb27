//! `ledgerpost-infra` — reference implementations of the posting core's
//! collaborator ports.
//!
//! Everything here is in-memory: the atomic counter cache, the ledger store
//! with all-or-nothing batch persistence, the static classification source,
//! and the fire-and-forget adjustment scheduler. Durable backends implement
//! the same ports.

pub mod memory;
pub mod observability;
pub mod scheduler;

pub use memory::{
    InMemoryCounterCache, InMemoryLedgerStore, InMemoryTrialBalance, StaticClassification,
    StaticPartnerDirectory,
};
pub use scheduler::ThreadAdjustmentScheduler;

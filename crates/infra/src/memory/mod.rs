//! In-memory collaborators for tests and development.

mod classification;
mod counter;
mod store;
mod trial_balance;

pub use classification::{StaticClassification, StaticPartnerDirectory};
pub use counter::InMemoryCounterCache;
pub use store::InMemoryLedgerStore;
pub use trial_balance::InMemoryTrialBalance;

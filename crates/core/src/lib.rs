//! `ledgerpost-core` — foundation of the posting core.
//!
//! This crate contains the pieces every engine depends on and nothing that
//! touches a database, broker or cache directly: the error taxonomy, the
//! read-only classification reference types, the counter-cache port with the
//! sequence generator built on it, the account-number codec, and the
//! per-call context (deadline + cancellation).

pub mod account_number;
pub mod classification;
pub mod context;
pub mod error;
pub mod sequence;

pub use account_number::{decode_sequence, encode_account_number, DEFAULT_ENTITY_CODE};
pub use classification::{
    Category, Classification, Currency, EntityStatus, LegalEntity, ProductType, SubCategory,
};
pub use context::CallContext;
pub use error::{LedgerError, LedgerResult, ResourceKind};
pub use sequence::{category_scope, CounterCache, SequenceGenerator, SPLIT_ID_SCOPE};

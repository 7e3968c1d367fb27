//! `ledgerpost-events` — outbound event surface of the posting core.
//!
//! Defines the payloads downstream consumers receive, the synchronous
//! publisher port, and the publication gateway that guarantees
//! at-least-once delivery with per-message dead-letter fallback.

pub mod gateway;
pub mod in_memory;
pub mod payload;
pub mod publisher;

pub use gateway::{Delivery, EventGateway};
pub use in_memory::InMemoryPublisher;
pub use payload::{
    AccountCreated, AccountUpdated, DeadLetter, EntryCreated, TOPIC_ACCOUNTS, TOPIC_ACCOUNTS_DLQ,
    TOPIC_JOURNAL_ENTRIES, TOPIC_JOURNAL_ENTRIES_DLQ,
};
pub use publisher::Publisher;

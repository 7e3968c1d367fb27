//! Synchronous message-publisher port.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use ledgerpost_core::LedgerResult;

/// Transport-agnostic publisher contract.
///
/// Delivery is at-least-once from the consumer's point of view; consumers
/// key on account number or split id and must tolerate duplicates. A failed
/// publish surfaces as `Infrastructure` and is routed to the paired
/// dead-letter topic by the gateway, never swallowed here.
pub trait Publisher: Send + Sync {
    fn publish_sync(&self, topic: &str, key: &str, payload: &JsonValue) -> LedgerResult<()>;
}

impl<P> Publisher for Arc<P>
where
    P: Publisher + ?Sized,
{
    fn publish_sync(&self, topic: &str, key: &str, payload: &JsonValue) -> LedgerResult<()> {
        (**self).publish_sync(topic, key, payload)
    }
}

//! Event publication gateway: at-least-once delivery with per-message
//! dead-letter fallback.
//!
//! The durable store write is the unit of success; publication is a
//! separate, retryable side channel. A failed publish is compensated by
//! wrapping the original payload with the causing error and re-publishing to
//! the paired dead-letter topic. Only when even the dead-letter topic is
//! unreachable does the failure become fatal for that call path.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use ledgerpost_core::{LedgerError, LedgerResult};

use crate::payload::DeadLetter;
use crate::publisher::Publisher;

/// Outcome of a fallback-protected publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Reached the primary topic.
    Delivered,
    /// Primary publish failed; the payload was parked on the dead-letter
    /// topic with the given error description.
    DeadLettered { error: String },
}

/// Gateway every engine publishes through.
#[derive(Clone)]
pub struct EventGateway {
    publisher: Arc<dyn Publisher>,
}

impl EventGateway {
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }

    /// Publish without fallback. Used where the caller handles failure.
    pub fn publish<T: Serialize>(&self, topic: &str, key: &str, payload: &T) -> LedgerResult<()> {
        let value = serde_json::to_value(payload)
            .map_err(|e| LedgerError::infrastructure(format!("payload serialization: {e}")))?;
        self.publisher.publish_sync(topic, key, &value)
    }

    /// Publish, parking the payload on `dlq_topic` if the primary publish
    /// fails. Returns `Err` only when the dead-letter publish fails too.
    pub fn publish_or_dead_letter<T: Serialize>(
        &self,
        topic: &str,
        dlq_topic: &str,
        key: &str,
        payload: &T,
    ) -> LedgerResult<Delivery> {
        let value = serde_json::to_value(payload)
            .map_err(|e| LedgerError::infrastructure(format!("payload serialization: {e}")))?;

        match self.publisher.publish_sync(topic, key, &value) {
            Ok(()) => Ok(Delivery::Delivered),
            Err(cause) => {
                warn!(topic, key, %cause, "publish failed, routing to dead letter");
                let wrapped = DeadLetter {
                    event_id: Uuid::now_v7(),
                    source_topic: topic.to_string(),
                    key: key.to_string(),
                    error: cause.to_string(),
                    payload: value,
                    occurred_at: Utc::now(),
                };
                let dlq_value = serde_json::to_value(&wrapped).map_err(|e| {
                    LedgerError::infrastructure(format!("dead letter serialization: {e}"))
                })?;
                if let Err(dlq_err) = self.publisher.publish_sync(dlq_topic, key, &dlq_value) {
                    error!(topic = dlq_topic, key, %dlq_err, "dead letter publish failed");
                    return Err(dlq_err);
                }
                Ok(Delivery::DeadLettered {
                    error: cause.to_string(),
                })
            }
        }
    }

    /// Park a payload on the dead-letter topic without attempting primary
    /// delivery. Used when a publish is known to have failed already, e.g.
    /// cancellation after the durable commit.
    pub fn dead_letter<T: Serialize>(
        &self,
        source_topic: &str,
        dlq_topic: &str,
        key: &str,
        payload: &T,
        cause: &str,
    ) -> LedgerResult<()> {
        let value = serde_json::to_value(payload)
            .map_err(|e| LedgerError::infrastructure(format!("payload serialization: {e}")))?;
        let wrapped = DeadLetter {
            event_id: Uuid::now_v7(),
            source_topic: source_topic.to_string(),
            key: key.to_string(),
            error: cause.to_string(),
            payload: value,
            occurred_at: Utc::now(),
        };
        let dlq_value = serde_json::to_value(&wrapped)
            .map_err(|e| LedgerError::infrastructure(format!("dead letter serialization: {e}")))?;
        self.publisher.publish_sync(dlq_topic, key, &dlq_value)
    }

    /// Standalone redelivery of a previously dead-lettered entry. The
    /// original payload is re-published to its source topic and falls back
    /// to the dead-letter topic again on repeated failure.
    pub fn retry_dead_letter(&self, dlq_topic: &str, parked: &DeadLetter) -> LedgerResult<Delivery> {
        self.publish_or_dead_letter(&parked.source_topic, dlq_topic, &parked.key, &parked.payload)
    }
}

impl core::fmt::Debug for EventGateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventGateway").finish_non_exhaustive()
    }
}

//! In-memory publisher for tests/dev.

use std::collections::HashSet;
use std::sync::Mutex;

use serde_json::Value as JsonValue;

use ledgerpost_core::{LedgerError, LedgerResult};

use crate::publisher::Publisher;

/// Records every publish per topic; individual topics can be failed to
/// exercise the dead-letter path.
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    published: Mutex<Vec<(String, String, JsonValue)>>,
    failing_topics: Mutex<HashSet<String>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish to `topic` fail until healed.
    pub fn fail_topic(&self, topic: &str) {
        self.failing_topics.lock().unwrap().insert(topic.to_string());
    }

    pub fn heal_topic(&self, topic: &str) {
        self.failing_topics.lock().unwrap().remove(topic);
    }

    /// All `(key, payload)` pairs delivered to `topic`, in publish order.
    pub fn published_to(&self, topic: &str) -> Vec<(String, JsonValue)> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _, _)| t == topic)
            .map(|(_, k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Publisher for InMemoryPublisher {
    fn publish_sync(&self, topic: &str, key: &str, payload: &JsonValue) -> LedgerResult<()> {
        if self.failing_topics.lock().unwrap().contains(topic) {
            return Err(LedgerError::infrastructure(format!(
                "topic '{topic}' unreachable"
            )));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), key.to_string(), payload.clone()));
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

/// A tagged event as it travels through the pipeline.
///
/// `time` is the event time in whole seconds since the Unix epoch.
/// `record` is the structured payload; outputs never interpret it beyond
/// serializing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub tag: String,
    pub time: i64,
    pub record: serde_json::Value,
}

impl EventRecord {
    pub fn new(tag: impl Into<String>, time: i64, record: serde_json::Value) -> Self {
        Self {
            tag: tag.into(),
            time,
            record,
        }
    }
}

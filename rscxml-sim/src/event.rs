//! Events and event-descriptor matching.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event as the simulator queues it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,

    /// Event payload, readable from guards as `_event.data`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Matches an event name against a transition's event descriptor.
///
/// A descriptor is a space-separated token list. `*` matches every
/// event; any other token matches the exact name or any name extending
/// it at a `.` boundary, so `error` covers `error.comms` but not
/// `errors`. Trailing `.*` and `.` on a token are ignored.
pub fn descriptor_matches(descriptor: &str, event: &str) -> bool {
    descriptor.split_whitespace().any(|token| {
        if token == "*" {
            return true;
        }
        let token = token
            .strip_suffix(".*")
            .or_else(|| token.strip_suffix('.'))
            .unwrap_or(token);
        if token.is_empty() {
            return false;
        }
        event == token
            || (event.len() > token.len()
                && event.starts_with(token)
                && event.as_bytes()[token.len()] == b'.')
    })
}

//! The action trace.
//!
//! Every executable-content callback the host services appends one
//! entry. Tests assert on the trace; the CLI prints it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded host action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEntry {
    Log {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        value: Value,
    },
    Raise {
        event: String,
    },
    Send {
        #[serde(skip_serializing_if = "Option::is_none")]
        event: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        delay: Option<String>,
    },
    Cancel {
        #[serde(skip_serializing_if = "Option::is_none")]
        sendid: Option<String>,
    },
    Script {
        #[serde(skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },
    Assign {
        location: String,
        value: Value,
    },
    DataInit {
        id: String,
        value: Value,
    },
    Invoke {
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        machine: Option<usize>,
        uninvoke: bool,
    },
    DoneEvent {
        event: String,
    },
}

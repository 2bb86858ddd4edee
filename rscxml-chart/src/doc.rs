//! Chart documents.
//!
//! Charts use a JSON DSL:
//!
//! ```json
//! {
//!   "name": "microwave",
//!   "initial": ["off"],
//!   "states": [
//!     {"id": "off", "transitions": [{"event": "turn.on", "target": ["on"]}]},
//!     {"id": "on", "initial": ["idle"],
//!      "states": [
//!        {"id": "idle", "transitions": [{"event": "door.close", "target": ["cooking"]}]},
//!        {"id": "cooking", "on_entry": [{"type": "log", "label": "cooking"}],
//!         "transitions": [{"event": "door.open", "target": ["idle"]}]}
//!      ],
//!      "transitions": [{"event": "turn.off", "target": ["off"]}]}
//!   ]
//! }
//! ```
//!
//! Document order within a state is its child `states` in list order
//! followed by its own `transitions` in list order. The root element is
//! itself a state-like node and receives document index 0.

use crate::action::{ActionNode, InvokeSpec, ParamSpec};
use crate::error::ChartError;
use serde::{Deserialize, Serialize};

/// Invocation type URI treated as an inline statechart machine.
pub const SCXML_INVOKE_URI: &str = "http://www.w3.org/TR/scxml/";

/// Data binding discipline for `data` blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// All data initialized when the machine starts.
    #[default]
    Early,
    /// Data initialized on first entry of the owning state.
    Late,
}

/// A whole chart document; the root state-like element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datamodel: Option<String>,

    #[serde(default)]
    pub binding: Binding,

    /// Ids of the default-entry states; empty means first child.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial: Vec<String>,

    /// Root-level scripts, run once before the first entry set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<ActionNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateNode>,

    /// Transitions sourced at the root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionNode>,
}

impl ChartDoc {
    /// Parses a chart from a JSON value.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ChartError> {
        Ok(serde_json::from_value(json.clone())?)
    }

    /// Parses a chart from JSON text.
    pub fn from_str(text: &str) -> Result<Self, ChartError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// What a state node is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateNodeKind {
    #[default]
    State,
    Parallel,
    Final,
    History,
    Initial,
}

/// Shallow or deep history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    #[default]
    Shallow,
    Deep,
}

/// A state-like node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateNode {
    #[serde(default)]
    pub kind: StateNodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Default-entry state ids (compound states only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial: Vec<String>,

    /// History depth; meaningful for `kind: history` only.
    #[serde(default)]
    pub history_type: HistoryKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_entry: Vec<ActionNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_exit: Vec<ActionNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invoke: Vec<InvokeSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donedata: Option<DoneDataSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<StateNode>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionNode>,
}

impl StateNode {
    /// True for history and initial pseudo states.
    pub fn is_pseudo(&self) -> bool {
        matches!(self.kind, StateNodeKind::History | StateNodeKind::Initial)
    }
}

/// External or internal transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    #[default]
    External,
    Internal,
}

/// A transition element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionNode {
    /// Event descriptor; absent makes the transition spontaneous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Guard expression, evaluated by the host datamodel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,

    /// Target state ids; empty makes the transition targetless.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<String>,

    #[serde(default)]
    pub kind: TransitionKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<ActionNode>,
}

/// A `data` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Donedata attached to a final state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoneDataSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimal_chart() {
        let doc = ChartDoc::from_json(&json!({
            "name": "switch",
            "states": [
                {"id": "off", "transitions": [{"event": "flip", "target": ["on"]}]},
                {"id": "on", "transitions": [{"event": "flip", "target": ["off"]}]}
            ]
        }))
        .unwrap();

        assert_eq!(doc.name.as_deref(), Some("switch"));
        assert_eq!(doc.states.len(), 2);
        assert_eq!(doc.states[0].kind, StateNodeKind::State);
        assert_eq!(doc.states[0].transitions[0].event.as_deref(), Some("flip"));
        assert_eq!(doc.states[0].transitions[0].target, vec!["on"]);
    }

    #[test]
    fn test_parse_pseudo_states() {
        let doc = ChartDoc::from_str(
            r#"{
                "states": [
                    {"id": "c", "states": [
                        {"kind": "initial", "transitions": [{"target": ["a"]}]},
                        {"kind": "history", "id": "h", "history_type": "deep",
                         "transitions": [{"target": ["a"]}]},
                        {"id": "a"},
                        {"id": "b"}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let c = &doc.states[0];
        assert_eq!(c.states[0].kind, StateNodeKind::Initial);
        assert!(c.states[0].is_pseudo());
        assert_eq!(c.states[1].history_type, HistoryKind::Deep);
        assert!(!c.states[2].is_pseudo());
    }

    #[test]
    fn test_defaults() {
        let doc = ChartDoc::from_str("{}").unwrap();
        assert_eq!(doc.binding, Binding::Early);
        assert!(doc.states.is_empty());
        assert!(doc.initial.is_empty());

        let t: TransitionNode = serde_json::from_str("{}").unwrap();
        assert_eq!(t.kind, TransitionKind::External);
        assert!(t.event.is_none());
        assert!(t.target.is_empty());
    }

    #[test]
    fn test_malformed_document() {
        assert!(ChartDoc::from_str("{\"states\": 3}").is_err());
    }
}

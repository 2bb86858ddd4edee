//! Executable-content nodes.
//!
//! Actions appear under `on_entry`, `on_exit`, transition `actions`,
//! invoke `finalize` and the root `scripts` list, and are lowered by the
//! compiler into host-callback programs.

use crate::doc::ChartDoc;
use serde::{Deserialize, Serialize};

/// One authored executable-content element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionNode {
    Script {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        src: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Log {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expr: Option<String>,
    },
    Raise {
        event: String,
    },
    Send(SendSpec),
    Cancel {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sendid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sendidexpr: Option<String>,
    },
    Assign {
        location: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expr: Option<String>,
        /// Inline value used when `expr` is absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Foreach {
        array: String,
        item: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        body: Vec<ActionNode>,
    },
    If {
        cond: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        then: Vec<ActionNode>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        elif: Vec<ElifArm>,
        #[serde(default, rename = "else", skip_serializing_if = "Vec::is_empty")]
        otherwise: Vec<ActionNode>,
    },
}

/// An `elseif` arm of an `if`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElifArm {
    pub cond: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<ActionNode>,
}

/// A `send` element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targetexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typeexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idlocation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delayexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namelist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contentexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
}

/// A `param` child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// An `invoke` element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvokeSpec {
    /// Invocation type; absent, `"scxml"` and the SCXML URI select the
    /// nested-machine compiler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoke_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typeexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srcexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idlocation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namelist: Option<String>,
    #[serde(default)]
    pub autoforward: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalize: Vec<ActionNode>,
    /// Inline nested chart or literal content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<InvokeContent>,
}

/// Payload of an invoke `content` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvokeContent {
    /// A nested chart document.
    Chart(Box<ChartDoc>),
    /// Literal text handed to the host.
    Text(String),
}

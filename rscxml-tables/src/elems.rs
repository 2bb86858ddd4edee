//! Sidecar element records.
//!
//! Executable-content actions that carry more than a couple of strings
//! (`send`, `invoke`, `foreach`, `data`, `donedata`) are materialized
//! here at known indices; the lowered programs reference them by index
//! and the kernel hands the records to the host callbacks untouched.

use crate::{MachineId, ProgramId, StateId};
use serde::{Deserialize, Serialize};

/// A `data` block attached to a state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElemData {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A state's span in the machine data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSpan {
    /// Index of the first block.
    pub first: usize,
    /// Number of blocks.
    pub count: usize,
}

/// A `param` child of send, invoke or donedata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElemParam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A `send` descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElemSend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eventexpr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targetexpr: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typeexpr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idlocation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delayexpr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namelist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ElemParam>,
}

/// An `invoke` descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElemInvoke {
    /// Index of the nested machine in the flat machine table, when the
    /// invocation compiles to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<MachineId>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typeexpr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srcexpr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idlocation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namelist: Option<String>,
    #[serde(default)]
    pub autoforward: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ElemParam>,
    /// Finalize program, run by the host against returned events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalize: Option<ProgramId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentexpr: Option<String>,
}

/// A `foreach` descriptor; the loop body is lowered inline in the
/// owning program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElemForeach {
    pub array: String,
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

/// Donedata attached to a final state, delivered with its
/// `done.state.*` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElemDoneData {
    /// The final state carrying the donedata.
    pub source: StateId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contentexpr: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ElemParam>,
}

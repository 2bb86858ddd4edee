//! Lowered executable-content programs.
//!
//! An `onentry`, `onexit`, transition body, finalize block or global
//! script lowers to a `Program`: an ordered list of actions, each a
//! single host-callback invocation. Structured content keeps its shape
//! (`if` arms, inline `foreach` bodies); everything that carries real
//! payload points into the sidecar tables by index.

use serde::{Deserialize, Serialize};

/// An ordered callback program.
pub type Program = Vec<Action>;

/// One lowered executable-content element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    /// `<script>` → `exec_content_script(src?, content?)`.
    Script {
        #[serde(skip_serializing_if = "Option::is_none")]
        src: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },

    /// `<log>` → `exec_content_log(label?, expr?)`.
    Log {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expr: Option<String>,
    },

    /// `<raise>` → `exec_content_raise(event)`.
    Raise { event: String },

    /// `<send>` → `exec_content_send(&sends[send])`.
    Send { send: usize },

    /// `<cancel>` → `exec_content_cancel(sendid?, sendidexpr?)`.
    Cancel {
        #[serde(skip_serializing_if = "Option::is_none")]
        sendid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sendidexpr: Option<String>,
    },

    /// `<assign>` → `exec_content_assign(location, expr-or-content)`.
    Assign {
        location: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expr: Option<String>,
    },

    /// `<foreach>` → init / next-loop over the inline body / done.
    Foreach { foreach: usize, body: Program },

    /// `<if>`/`<elseif>`/`<else>` → the first arm whose condition holds
    /// runs; a condition-less arm is the `else`.
    If { arms: Vec<IfArm> },

    /// One `<invoke>` element → `invoke(&invokes[invoke], uninvoke)`.
    Invoke { invoke: usize },
}

/// One branch of a lowered `if`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfArm {
    /// Branch guard; `None` marks the `else` arm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cond: Option<String>,
    pub body: Program,
}

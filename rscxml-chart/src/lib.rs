//! # rscxml-chart
//!
//! The statechart document model: a JSON DSL mirroring the SCXML element
//! family (compound and parallel states, history and initial pseudo
//! states, transitions with guards, executable content, invokes), plus
//! the sibling resorter that normalizes child order before indexing.
//!
//! This crate knows nothing about bitsets or descriptor tables; it only
//! describes charts as authored.

pub mod action;
pub mod doc;
pub mod error;
pub mod resort;

pub use action::{ActionNode, ElifArm, InvokeContent, InvokeSpec, ParamSpec, SendSpec};
pub use doc::{
    Binding, ChartDoc, DataSpec, DoneDataSpec, HistoryKind, StateNode, StateNodeKind,
    TransitionKind, TransitionNode, SCXML_INVOKE_URI,
};
pub use error::ChartError;
pub use resort::resort;

//! State descriptors.

use crate::bitset::BitSet;
use crate::elems::DataSpan;
use crate::{ProgramId, StateId};
use serde::{Deserialize, Serialize};

/// High bit of the packed type byte: the state has a history child.
pub const STATE_HAS_HISTORY: u8 = 0x80;

/// Mask selecting the type proper from the packed type byte.
pub const STATE_TYPE_MASK: u8 = 0x7f;

/// The seven state types.
///
/// The root `scxml` element is classified as a compound state; pseudo
/// states (histories and initials) never appear in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StateKind {
    Atomic = 1,
    Parallel = 2,
    Compound = 3,
    Final = 4,
    HistoryDeep = 5,
    HistoryShallow = 6,
    Initial = 7,
}

impl StateKind {
    /// The numeric encoding of the type proper.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a packed type byte, ignoring the has-history bit.
    pub fn from_code(code: u8) -> Option<Self> {
        match code & STATE_TYPE_MASK {
            1 => Some(StateKind::Atomic),
            2 => Some(StateKind::Parallel),
            3 => Some(StateKind::Compound),
            4 => Some(StateKind::Final),
            5 => Some(StateKind::HistoryDeep),
            6 => Some(StateKind::HistoryShallow),
            7 => Some(StateKind::Initial),
            _ => None,
        }
    }

    /// True for shallow and deep history pseudo states.
    pub fn is_history(self) -> bool {
        matches!(self, StateKind::HistoryDeep | StateKind::HistoryShallow)
    }

    /// True for states that never enter a configuration.
    pub fn is_pseudo(self) -> bool {
        self.is_history() || self == StateKind::Initial
    }
}

/// A compiled state record.
///
/// Relation bitsets are sized to the owning machine's state count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDesc {
    /// Document-order index; stable identity within the machine.
    pub idx: StateId,

    /// Index of the parent state; the root is its own parent.
    pub parent: StateId,

    /// State type.
    pub kind: StateKind,

    /// True if any history pseudo state sits below this state's scope.
    pub has_history: bool,

    /// State id from the document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// All direct children.
    pub children: BitSet,

    /// Default completion; see the relation builder for the per-kind
    /// meaning.
    pub completion: BitSet,

    /// All proper ancestors, root included.
    pub ancestors: BitSet,

    /// Span of this state's blocks in the machine's data table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSpan>,

    /// Entry handler program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_entry: Option<ProgramId>,

    /// Exit handler program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_exit: Option<ProgramId>,

    /// Invocation program (one `invoke` action per invoke element).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoke: Option<ProgramId>,
}

impl StateDesc {
    /// The packed type byte: type proper in the low bits, has-history in
    /// the high bit.
    pub fn type_code(&self) -> u8 {
        let mut code = self.kind.code();
        if self.has_history {
            code |= STATE_HAS_HISTORY;
        }
        code
    }
}

//! Transition descriptors.

use crate::bitset::BitSet;
use crate::{ProgramId, StateId, TransId};
use serde::{Deserialize, Serialize};

/// Transition has no triggering event.
pub const TRANS_SPONTANEOUS: u8 = 0x01;
/// Transition names no target states.
pub const TRANS_TARGETLESS: u8 = 0x02;
/// Transition was declared `internal`.
pub const TRANS_INTERNAL: u8 = 0x04;
/// Default transition of a history pseudo state.
pub const TRANS_HISTORY: u8 = 0x08;
/// Default transition of an initial pseudo state.
pub const TRANS_INITIAL: u8 = 0x10;

/// Packed transition flag byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransFlags(pub u8);

impl TransFlags {
    pub fn contains(self, bits: u8) -> bool {
        self.0 & bits != 0
    }

    pub fn insert(&mut self, bits: u8) {
        self.0 |= bits;
    }

    pub fn is_spontaneous(self) -> bool {
        self.contains(TRANS_SPONTANEOUS)
    }

    pub fn is_targetless(self) -> bool {
        self.contains(TRANS_TARGETLESS)
    }

    pub fn is_internal(self) -> bool {
        self.contains(TRANS_INTERNAL)
    }

    /// True for history and initial default transitions, which are never
    /// selected by event matching.
    pub fn is_default_entry(self) -> bool {
        self.contains(TRANS_HISTORY | TRANS_INITIAL)
    }
}

/// A compiled transition record.
///
/// Transitions are stored in post-fix traversal order; the table position
/// doubles as the priority, lower meaning higher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransDesc {
    /// Document-order index of the transition.
    pub idx: TransId,

    /// Source state.
    pub source: StateId,

    /// Directly named target states; empty when targetless.
    pub target: BitSet,

    /// Event descriptor, absent for spontaneous transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// Guard expression, evaluated by the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Transition action program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_transition: Option<ProgramId>,

    /// Type flags.
    pub flags: TransFlags,

    /// Transitions pre-empted when this one fires (over transitions,
    /// reflexive and symmetric).
    pub conflicts: BitSet,

    /// States exited when this transition fires alone (over states).
    pub exit_set: BitSet,
}

//! # rscxml-tables
//!
//! The portable artifact produced by the statechart compiler and consumed
//! by the stepping kernel: bitset-encoded relation tables, state and
//! transition descriptors, executable-content programs, and the sidecar
//! element records.
//!
//! Everything here is plain data. Cross-references are integer indices
//! into flat tables, so a machine table can be serialized, moved between
//! processes, and shared read-only across any number of contexts.

pub mod bitset;
pub mod codes;
pub mod elems;
pub mod machine;
pub mod program;
pub mod state;
pub mod transition;

pub use bitset::BitSet;
pub use codes::StepCode;
pub use elems::{DataSpan, ElemData, ElemDoneData, ElemForeach, ElemInvoke, ElemParam, ElemSend};
pub use machine::{MachineDesc, MachineTable};
pub use program::{Action, IfArm, Program};
pub use state::{StateDesc, StateKind, STATE_HAS_HISTORY, STATE_TYPE_MASK};
pub use transition::{
    TransDesc, TransFlags, TRANS_HISTORY, TRANS_INITIAL, TRANS_INTERNAL, TRANS_SPONTANEOUS,
    TRANS_TARGETLESS,
};

/// Document-order index of a state.
pub type StateId = usize;

/// Post-fix (priority) index of a transition.
pub type TransId = usize;

/// Index into a machine's program table.
pub type ProgramId = usize;

/// Index into the flat machine table.
pub type MachineId = usize;

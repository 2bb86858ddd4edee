//! Machine records and the flat machine table.

use crate::bitset::BitSet;
use crate::elems::{ElemData, ElemDoneData, ElemForeach, ElemInvoke, ElemSend};
use crate::program::Program;
use crate::state::StateDesc;
use crate::transition::TransDesc;
use crate::{MachineId, ProgramId, StateId};
use serde::{Deserialize, Serialize};

/// One compiled machine: descriptor tables plus sidecars.
///
/// Everything is immutable after compilation and may be shared across
/// any number of contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineDesc {
    /// Machine name from the document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Datamodel tag from the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datamodel: Option<String>,

    /// crc32c of the source document, used to cross-link invokes to
    /// nested machines.
    pub checksum: String,

    /// Parent machine in the flat table, absent for the top machine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<MachineId>,

    /// States in document order.
    pub states: Vec<StateDesc>,

    /// Transitions in post-fix (priority) order.
    pub transitions: Vec<TransDesc>,

    /// Donedata records, searched by source state.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub donedata: Vec<ElemDoneData>,

    /// Data blocks, addressed by per-state spans.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datas: Vec<ElemData>,

    /// Send descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sends: Vec<ElemSend>,

    /// Invoke descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invokes: Vec<ElemInvoke>,

    /// Foreach descriptors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreachs: Vec<ElemForeach>,

    /// Lowered callback programs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub programs: Vec<Program>,

    /// Root-level script program, run once on the first step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_script: Option<ProgramId>,
}

impl MachineDesc {
    /// Number of states.
    pub fn nr_states(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions.
    pub fn nr_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// An empty bitset sized for this machine's states.
    pub fn state_bits(&self) -> BitSet {
        BitSet::with_capacity(self.states.len())
    }

    /// An empty bitset sized for this machine's transitions.
    ///
    /// State and transition counts are sized independently.
    pub fn trans_bits(&self) -> BitSet {
        BitSet::with_capacity(self.transitions.len())
    }

    /// The first donedata record attached to `source`, if any.
    pub fn find_donedata(&self, source: StateId) -> Option<&ElemDoneData> {
        self.donedata.iter().find(|dd| dd.source == source)
    }

    /// Looks up a state by its document id.
    pub fn state_by_name(&self, name: &str) -> Option<&StateDesc> {
        self.states.iter().find(|s| s.name.as_deref() == Some(name))
    }
}

/// All machines reachable from a top-level compilation, laid out
/// contiguously; index 0 is the top machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineTable {
    pub machines: Vec<MachineDesc>,
}

impl MachineTable {
    /// The top-level machine.
    pub fn root(&self) -> &MachineDesc {
        &self.machines[0]
    }

    /// Number of machines in the table.
    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Finds a machine by its content hash.
    pub fn by_checksum(&self, checksum: &str) -> Option<MachineId> {
        self.machines.iter().position(|m| m.checksum == checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateKind;

    fn tiny_machine() -> MachineDesc {
        let mk_state = |idx: usize, parent: usize, kind: StateKind, name: Option<&str>| StateDesc {
            idx,
            parent,
            kind,
            has_history: false,
            name: name.map(str::to_string),
            children: BitSet::with_capacity(2),
            completion: BitSet::with_capacity(2),
            ancestors: BitSet::with_capacity(2),
            data: None,
            on_entry: None,
            on_exit: None,
            invoke: None,
        };
        MachineDesc {
            name: Some("tiny".to_string()),
            datamodel: None,
            checksum: "deadbeef".to_string(),
            parent: None,
            states: vec![
                mk_state(0, 0, StateKind::Compound, None),
                mk_state(1, 0, StateKind::Final, Some("end")),
            ],
            transitions: vec![],
            donedata: vec![ElemDoneData {
                source: 1,
                content: Some("done".to_string()),
                contentexpr: None,
                params: vec![],
            }],
            datas: vec![],
            sends: vec![],
            invokes: vec![],
            foreachs: vec![],
            programs: vec![],
            global_script: None,
        }
    }

    #[test]
    fn test_bitset_sizing_is_independent() {
        let machine = tiny_machine();
        assert_eq!(machine.state_bits().capacity(), 8);
        assert_eq!(machine.trans_bits().byte_len(), 0);
    }

    #[test]
    fn test_find_donedata() {
        let machine = tiny_machine();
        assert!(machine.find_donedata(1).is_some());
        assert!(machine.find_donedata(0).is_none());
    }

    #[test]
    fn test_state_by_name() {
        let machine = tiny_machine();
        assert_eq!(machine.state_by_name("end").map(|s| s.idx), Some(1));
        assert!(machine.state_by_name("missing").is_none());
    }

    #[test]
    fn test_table_lookup_by_checksum() {
        let table = MachineTable {
            machines: vec![tiny_machine()],
        };
        assert_eq!(table.by_checksum("deadbeef"), Some(0));
        assert_eq!(table.by_checksum("cafebabe"), None);
        assert_eq!(table.len(), 1);
        assert_eq!(table.root().name.as_deref(), Some("tiny"));
    }

    #[test]
    fn test_machine_serde_roundtrip() {
        let table = MachineTable {
            machines: vec![tiny_machine()],
        };
        let json = serde_json::to_string(&table).unwrap();
        let back: MachineTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.root().checksum, "deadbeef");
        assert_eq!(back.root().nr_states(), 2);
    }
}

//! Document-order indexing.
//!
//! A single pre-order walk assigns indices 0..N-1 to every state-like
//! node, the root first, and records parent linkage. Transitions are
//! collected in post-fix order: all transitions of a state's descendants
//! (in child order) precede the state's own, so deeper transitions
//! out-prioritize their ancestors'. The table position doubles as both
//! the document index and the priority.

use crate::error::CompileError;
use rscxml_chart::{
    ActionNode, ChartDoc, DataSpec, DoneDataSpec, HistoryKind, InvokeSpec, StateNode,
    StateNodeKind, TransitionNode,
};
use rscxml_tables::StateKind;
use std::collections::HashMap;

/// One indexed state-like node.
pub(crate) struct StateEntry<'a> {
    pub parent: usize,
    pub kind: StateKind,
    pub id: Option<&'a str>,
    pub initial: &'a [String],
    pub data: &'a [DataSpec],
    pub on_entry: &'a [ActionNode],
    pub on_exit: &'a [ActionNode],
    pub invoke: &'a [InvokeSpec],
    pub donedata: Option<&'a DoneDataSpec>,
}

/// One indexed transition, stored in post-fix order.
pub(crate) struct TransEntry<'a> {
    /// Document index; under this DSL it coincides with the post-fix
    /// position.
    pub doc_idx: usize,
    /// Index of the source state.
    pub source: usize,
    pub node: &'a TransitionNode,
}

/// The indexed chart.
pub(crate) struct Indexed<'a> {
    pub states: Vec<StateEntry<'a>>,
    pub transitions: Vec<TransEntry<'a>>,
    pub id_map: HashMap<&'a str, usize>,
}

impl<'a> Indexed<'a> {
    pub fn nr_states(&self) -> usize {
        self.states.len()
    }

    /// Resolves a state id.
    pub fn lookup(&self, id: &str) -> Option<usize> {
        self.id_map.get(id).copied()
    }
}

/// Indexes a resorted document.
pub(crate) fn index(doc: &ChartDoc) -> Result<Indexed<'_>, CompileError> {
    let mut indexed = Indexed {
        states: Vec::new(),
        transitions: Vec::new(),
        id_map: HashMap::new(),
    };

    // The root is state number 0 and its own parent.
    indexed.states.push(StateEntry {
        parent: 0,
        kind: StateKind::Compound,
        id: None,
        initial: &doc.initial,
        data: &doc.data,
        on_entry: &[],
        on_exit: &[],
        invoke: &[],
        donedata: None,
    });
    index_states(&doc.states, 0, &mut indexed)?;

    let mut next_state = 1;
    collect_postfix(
        &doc.states,
        &doc.transitions,
        0,
        &mut next_state,
        &mut indexed.transitions,
    );

    Ok(indexed)
}

fn index_states<'a>(
    children: &'a [StateNode],
    parent: usize,
    indexed: &mut Indexed<'a>,
) -> Result<(), CompileError> {
    for child in children {
        let idx = indexed.states.len();
        if let Some(id) = child.id.as_deref() {
            if indexed.id_map.insert(id, idx).is_some() {
                return Err(CompileError::DuplicateStateId { id: id.to_string() });
            }
        }
        indexed.states.push(StateEntry {
            parent,
            kind: classify(child),
            id: child.id.as_deref(),
            initial: &child.initial,
            data: &child.data,
            on_entry: &child.on_entry,
            on_exit: &child.on_exit,
            invoke: &child.invoke,
            donedata: child.donedata.as_ref(),
        });
        index_states(&child.states, idx, indexed)?;
    }
    Ok(())
}

fn classify(node: &StateNode) -> StateKind {
    match node.kind {
        StateNodeKind::Parallel => StateKind::Parallel,
        StateNodeKind::Final => StateKind::Final,
        StateNodeKind::Initial => StateKind::Initial,
        StateNodeKind::History => match node.history_type {
            HistoryKind::Deep => StateKind::HistoryDeep,
            HistoryKind::Shallow => StateKind::HistoryShallow,
        },
        StateNodeKind::State => {
            if node.states.iter().any(|c| !c.is_pseudo()) {
                StateKind::Compound
            } else {
                StateKind::Atomic
            }
        }
    }
}

/// Post-fix transition walk. `next_state` replays the pre-order state
/// numbering so each transition knows its source index.
fn collect_postfix<'a>(
    children: &'a [StateNode],
    own_transitions: &'a [TransitionNode],
    source: usize,
    next_state: &mut usize,
    out: &mut Vec<TransEntry<'a>>,
) {
    for child in children {
        let idx = *next_state;
        *next_state += 1;
        collect_postfix(&child.states, &child.transitions, idx, next_state, out);
    }
    for t in own_transitions {
        out.push(TransEntry {
            doc_idx: out.len(),
            source,
            node: t,
        });
    }
}

//! Relation builder.
//!
//! Derives the bitset tables the kernel steps over: child, ancestor and
//! completion sets per state; target, exit and conflict sets per
//! transition. Direct O(N^2) scans over the indexed arrays; chart sizes
//! make anything smarter pointless.

use crate::error::CompileError;
use crate::index::Indexed;
use rscxml_tables::{
    BitSet, StateDesc, StateKind, TransDesc, TransFlags, TRANS_HISTORY, TRANS_INITIAL,
    TRANS_INTERNAL, TRANS_SPONTANEOUS, TRANS_TARGETLESS,
};
use rscxml_chart::TransitionKind;

/// Builds the state descriptor skeletons: relations, classification and
/// history flags. Program and data references are patched in later by
/// the emitter.
pub(crate) fn build_states(indexed: &Indexed<'_>) -> Result<Vec<StateDesc>, CompileError> {
    let n = indexed.nr_states();
    let mut states: Vec<StateDesc> = Vec::with_capacity(n);

    for (i, entry) in indexed.states.iter().enumerate() {
        let mut children = BitSet::with_capacity(n);
        let mut has_history = false;
        for (j, other) in indexed.states.iter().enumerate() {
            if j != i && other.parent == i {
                children.set(j);
                if other.kind.is_history() {
                    has_history = true;
                }
            }
        }

        let mut ancestors = BitSet::with_capacity(n);
        if i != 0 {
            let mut a = entry.parent;
            loop {
                ancestors.set(a);
                if a == 0 {
                    break;
                }
                a = indexed.states[a].parent;
            }
        }

        states.push(StateDesc {
            idx: i,
            parent: entry.parent,
            kind: entry.kind,
            has_history,
            name: entry.id.map(str::to_string),
            children,
            completion: BitSet::with_capacity(n),
            ancestors,
            data: None,
            on_entry: None,
            on_exit: None,
            invoke: None,
        });
    }

    // Histories themselves carry the flag when any other history lives
    // below the same parent; the kernel's nested-history re-entry keys
    // on it.
    for i in 0..n {
        if !states[i].kind.is_history() {
            continue;
        }
        let parent = states[i].parent;
        let nested = (0..n).any(|j| {
            j != i && states[j].kind.is_history() && states[j].ancestors.has(parent)
        });
        if nested {
            states[i].has_history = true;
        }
    }

    let completions: Vec<BitSet> = (0..n)
        .map(|i| completion_of(indexed, &states, i))
        .collect::<Result<_, _>>()?;
    for (state, completion) in states.iter_mut().zip(completions) {
        state.completion = completion;
    }

    Ok(states)
}

/// Default completion of one state.
fn completion_of(
    indexed: &Indexed<'_>,
    states: &[StateDesc],
    i: usize,
) -> Result<BitSet, CompileError> {
    let n = states.len();
    let mut completion = BitSet::with_capacity(n);

    match states[i].kind {
        StateKind::Parallel => {
            // Every region enters together.
            completion.copy_from(&states[i].children);
        }

        StateKind::HistoryDeep | StateKind::HistoryShallow => {
            // Candidate descendants of the parent; the history itself and
            // other histories are never candidates.
            let parent = states[i].parent;
            for j in 0..n {
                if j == i || states[j].kind.is_history() {
                    continue;
                }
                let eligible = if states[i].kind == StateKind::HistoryDeep {
                    states[j].ancestors.has(parent) && j != parent
                } else {
                    states[j].parent == parent && j != parent
                };
                if eligible {
                    completion.set(j);
                }
            }
        }

        StateKind::Compound => {
            let entry = &indexed.states[i];
            if !entry.initial.is_empty() {
                for id in entry.initial {
                    let j = indexed
                        .lookup(id)
                        .ok_or_else(|| CompileError::UnknownInitial { id: id.clone() })?;
                    completion.set(j);
                }
            } else if let Some(init) = states[i]
                .children
                .iter()
                .find(|&j| states[j].kind == StateKind::Initial)
            {
                // The kernel expands the pseudo state to its transition
                // target on entry.
                completion.set(init);
            } else if let Some(first) = states[i]
                .children
                .iter()
                .find(|&j| !states[j].kind.is_pseudo())
            {
                completion.set(first);
            }
        }

        StateKind::Atomic | StateKind::Final | StateKind::Initial => {}
    }

    Ok(completion)
}

/// Builds the transition descriptor skeletons in post-fix order.
pub(crate) fn build_transitions(
    indexed: &Indexed<'_>,
    states: &[StateDesc],
) -> Result<Vec<TransDesc>, CompileError> {
    let n_states = states.len();
    let n_trans = indexed.transitions.len();
    let mut transitions: Vec<TransDesc> = Vec::with_capacity(n_trans);

    for entry in &indexed.transitions {
        let node = entry.node;
        let mut target = BitSet::with_capacity(n_states);
        for id in &node.target {
            let j = indexed
                .lookup(id)
                .ok_or_else(|| CompileError::UnknownTarget { id: id.clone() })?;
            target.set(j);
        }

        let mut flags = TransFlags::default();
        if node.event.is_none() {
            flags.insert(TRANS_SPONTANEOUS);
        }
        if node.target.is_empty() {
            flags.insert(TRANS_TARGETLESS);
        }
        if node.kind == TransitionKind::Internal {
            flags.insert(TRANS_INTERNAL);
        }
        match states[entry.source].kind {
            StateKind::HistoryDeep | StateKind::HistoryShallow => flags.insert(TRANS_HISTORY),
            StateKind::Initial => flags.insert(TRANS_INITIAL),
            _ => {}
        }

        let exit_set = exit_set_of(states, entry.source, &target, &flags);

        transitions.push(TransDesc {
            idx: entry.doc_idx,
            source: entry.source,
            target,
            event: node.event.clone(),
            condition: node.cond.clone(),
            on_transition: None,
            flags,
            conflicts: BitSet::with_capacity(n_trans),
            exit_set,
        });
    }

    // Conflicts: exit sets intersect, shared source, or ancestor-related
    // sources. Reflexive and symmetric by construction.
    for i in 0..n_trans {
        let mut conflicts = BitSet::with_capacity(n_trans);
        for (j, other) in transitions.iter().enumerate() {
            let si = transitions[i].source;
            let sj = other.source;
            if transitions[i].exit_set.intersects(&other.exit_set)
                || si == sj
                || states[si].ancestors.has(sj)
                || states[sj].ancestors.has(si)
            {
                conflicts.set(j);
            }
        }
        transitions[i].conflicts = conflicts;
    }

    Ok(transitions)
}

/// States exited when the transition fires alone: all proper descendants
/// of the transition domain. Targetless transitions exit nothing.
fn exit_set_of(
    states: &[StateDesc],
    source: usize,
    target: &BitSet,
    flags: &TransFlags,
) -> BitSet {
    let n = states.len();
    let mut exit_set = BitSet::with_capacity(n);
    if flags.is_targetless() {
        return exit_set;
    }

    let Some(domain) = transition_domain(states, source, target, flags) else {
        return exit_set;
    };
    for j in 0..n {
        if states[j].ancestors.has(domain) {
            exit_set.set(j);
        }
    }
    exit_set
}

/// The least common compound ancestor of {source} and the targets, or
/// the source itself for internal transitions that stay inside a
/// compound source.
fn transition_domain(
    states: &[StateDesc],
    source: usize,
    target: &BitSet,
    flags: &TransFlags,
) -> Option<usize> {
    if flags.is_internal()
        && states[source].kind == StateKind::Compound
        && target.iter().all(|t| states[t].ancestors.has(source))
    {
        return Some(source);
    }

    // Walk the source's proper ancestors nearest-first; the first
    // compound one covering every target is the domain. The root is
    // compound, so the walk always terminates with an answer.
    if source == 0 {
        return Some(0);
    }
    let mut a = states[source].parent;
    loop {
        if states[a].kind == StateKind::Compound
            && target.iter().all(|t| t != a && states[t].ancestors.has(a))
        {
            return Some(a);
        }
        if a == 0 {
            return None;
        }
        a = states[a].parent;
    }
}

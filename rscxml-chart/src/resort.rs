//! Sibling resorter.
//!
//! Indexing assumes that at every level the pseudo states precede the
//! proper states: initials first, then deep histories, then shallow
//! histories, then everything else, with the original relative order kept
//! inside each bucket. The sort is stable, so applying it twice changes
//! nothing.

use crate::doc::{ChartDoc, HistoryKind, StateNode, StateNodeKind};

/// Reorders every sibling list of the document in place.
pub fn resort(doc: &mut ChartDoc) {
    sort_siblings(&mut doc.states);
}

fn sort_siblings(states: &mut [StateNode]) {
    for state in states.iter_mut() {
        sort_siblings(&mut state.states);
    }
    states.sort_by_key(bucket);
}

fn bucket(state: &StateNode) -> u8 {
    match state.kind {
        StateNodeKind::Initial => 0,
        StateNodeKind::History => match state.history_type {
            HistoryKind::Deep => 1,
            HistoryKind::Shallow => 2,
        },
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(kind: StateNodeKind, id: &str) -> StateNode {
        StateNode {
            kind,
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn history(id: &str, history_type: HistoryKind) -> StateNode {
        StateNode {
            kind: StateNodeKind::History,
            id: Some(id.to_string()),
            history_type,
            ..Default::default()
        }
    }

    fn ids(states: &[StateNode]) -> Vec<&str> {
        states.iter().filter_map(|s| s.id.as_deref()).collect()
    }

    #[test]
    fn test_bucket_order() {
        let mut doc = ChartDoc {
            states: vec![
                node(StateNodeKind::State, "a"),
                history("hs", HistoryKind::Shallow),
                node(StateNodeKind::Final, "f"),
                history("hd", HistoryKind::Deep),
                node(StateNodeKind::Initial, "i"),
                node(StateNodeKind::State, "b"),
            ],
            ..Default::default()
        };

        resort(&mut doc);
        assert_eq!(ids(&doc.states), vec!["i", "hd", "hs", "a", "f", "b"]);
    }

    #[test]
    fn test_relative_order_preserved_within_buckets() {
        let mut doc = ChartDoc {
            states: vec![
                node(StateNodeKind::State, "x"),
                history("h1", HistoryKind::Shallow),
                history("h2", HistoryKind::Shallow),
                node(StateNodeKind::State, "y"),
            ],
            ..Default::default()
        };

        resort(&mut doc);
        assert_eq!(ids(&doc.states), vec!["h1", "h2", "x", "y"]);
    }

    #[test]
    fn test_recurses_into_children() {
        let mut parent = node(StateNodeKind::State, "p");
        parent.states = vec![
            node(StateNodeKind::State, "inner"),
            history("h", HistoryKind::Shallow),
        ];
        let mut doc = ChartDoc {
            states: vec![parent],
            ..Default::default()
        };

        resort(&mut doc);
        assert_eq!(ids(&doc.states[0].states), vec!["h", "inner"]);
    }

    #[test]
    fn test_idempotent() {
        let mut doc = ChartDoc {
            states: vec![
                node(StateNodeKind::State, "a"),
                history("hd", HistoryKind::Deep),
                node(StateNodeKind::Initial, "i"),
                history("hs", HistoryKind::Shallow),
            ],
            ..Default::default()
        };

        resort(&mut doc);
        let once = ids(&doc.states)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        resort(&mut doc);
        assert_eq!(ids(&doc.states), once);
    }
}

//! The compilation pipeline.
//!
//! resort -> index -> relations -> lower -> emit, then recurse into
//! invoked charts so every machine reachable from the top lands in one
//! flat table.

use crate::discover::{ChartResolver, NoResolver};
use crate::error::CompileError;
use crate::index::index;
use crate::lower::{lower, NestedSource};
use crate::relations::{build_states, build_transitions};
use rscxml_chart::{resort, ChartDoc};
use rscxml_tables::{MachineDesc, MachineId, MachineTable, StateKind};

/// Compiles a chart with the default (refusing) resolver.
pub fn compile(doc: &ChartDoc) -> Result<MachineTable, CompileError> {
    Compiler::new().compile(doc)
}

/// Chart compiler.
pub struct Compiler<'r> {
    resolver: &'r dyn ChartResolver,
}

impl Default for Compiler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Compiler<'r> {
    pub fn new() -> Self {
        Self {
            resolver: &NoResolver,
        }
    }

    /// Uses `resolver` for invoke `src` references.
    pub fn with_resolver(resolver: &'r dyn ChartResolver) -> Self {
        Self { resolver }
    }

    /// Compiles `doc` and every nested machine it invokes.
    pub fn compile(&self, doc: &ChartDoc) -> Result<MachineTable, CompileError> {
        let mut machines = Vec::new();
        self.compile_into(doc, None, &mut machines)?;
        Ok(MachineTable { machines })
    }

    fn compile_into(
        &self,
        doc: &ChartDoc,
        parent: Option<MachineId>,
        machines: &mut Vec<MachineDesc>,
    ) -> Result<MachineId, CompileError> {
        // Fingerprint the document as authored, before any rewriting.
        let checksum = format!("{:08x}", crc32c::crc32c(&serde_json::to_vec(doc)?));

        let mut doc = doc.clone();
        resort(&mut doc);

        let indexed = index(&doc)?;
        let mut states = build_states(&indexed)?;
        let mut transitions = build_transitions(&indexed, &states)?;
        let lowered = lower(&doc, &indexed)?;

        for (state, programs) in states.iter_mut().zip(&lowered.state_programs) {
            state.on_entry = programs.on_entry;
            state.on_exit = programs.on_exit;
            state.invoke = programs.invoke;
            state.data = programs.data;
        }
        for (transition, program) in transitions.iter_mut().zip(&lowered.trans_programs) {
            transition.on_transition = *program;
        }

        validate_defaults(&states, &transitions)?;

        tracing::debug!(
            name = doc.name.as_deref().unwrap_or(""),
            states = states.len(),
            transitions = transitions.len(),
            checksum = %checksum,
            "compiled machine"
        );

        let idx = machines.len();
        machines.push(MachineDesc {
            name: doc.name.clone(),
            datamodel: doc.datamodel.clone(),
            checksum,
            parent,
            states,
            transitions,
            donedata: lowered.donedata,
            datas: lowered.datas,
            sends: lowered.sends,
            invokes: lowered.invokes,
            foreachs: lowered.foreachs,
            programs: lowered.programs,
            global_script: lowered.global_script,
        });

        // Compile invoked charts into the same table and cross-link the
        // invoke records by machine index.
        for (k, nested) in lowered.nested.into_iter().enumerate() {
            let nested_doc = match nested {
                None => continue,
                Some(NestedSource::Inline(chart)) => *chart,
                Some(NestedSource::Src(src)) => self.resolver.resolve(&src)?,
            };
            let child = self.compile_into(&nested_doc, Some(idx), machines)?;
            machines[idx].invokes[k].machine = Some(child);
            tracing::debug!(parent = idx, child, "linked nested machine");
        }

        Ok(idx)
    }
}

/// History and initial pseudo states own exactly one default transition,
/// and the kernel takes it without consulting event or guard.
fn validate_defaults(
    states: &[rscxml_tables::StateDesc],
    transitions: &[rscxml_tables::TransDesc],
) -> Result<(), CompileError> {
    for state in states {
        if !state.kind.is_pseudo() {
            continue;
        }
        let kind = if state.kind == StateKind::Initial {
            "initial"
        } else {
            "history"
        };
        let name = state
            .name
            .clone()
            .unwrap_or_else(|| format!("#{}", state.idx));

        let defaults: Vec<_> = transitions
            .iter()
            .filter(|t| t.source == state.idx)
            .collect();
        if defaults.len() != 1 {
            return Err(CompileError::DefaultTransition {
                kind,
                state: name,
                reason: format!("must own exactly one transition, found {}", defaults.len()),
            });
        }

        let t = defaults[0];
        if t.event.is_some() {
            return Err(CompileError::DefaultTransition {
                kind,
                state: name,
                reason: "default transition must not name an event".to_string(),
            });
        }
        if !t.target.any() {
            return Err(CompileError::DefaultTransition {
                kind,
                state: name,
                reason: "default transition must name a target".to_string(),
            });
        }
        if state.kind == StateKind::Initial && t.condition.is_some() {
            return Err(CompileError::DefaultTransition {
                kind,
                state: name,
                reason: "default transition must not carry a guard".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(value: serde_json::Value) -> ChartDoc {
        ChartDoc::from_json(&value).unwrap()
    }

    #[test]
    fn test_compile_minimal() {
        let table = compile(&chart(json!({
            "name": "switch",
            "states": [
                {"id": "off", "transitions": [{"event": "flip", "target": ["on"]}]},
                {"id": "on", "transitions": [{"event": "flip", "target": ["off"]}]}
            ]
        })))
        .unwrap();

        assert_eq!(table.len(), 1);
        let m = table.root();
        assert_eq!(m.name.as_deref(), Some("switch"));
        assert_eq!(m.nr_states(), 3);
        assert_eq!(m.nr_transitions(), 2);
        assert_eq!(m.checksum.len(), 8);
    }

    #[test]
    fn test_programs_patched_into_descriptors() {
        let table = compile(&chart(json!({
            "states": [
                {"id": "a",
                 "on_entry": [{"type": "log", "label": "in"}],
                 "on_exit": [{"type": "log", "label": "out"}],
                 "transitions": [{"event": "e", "target": ["b"],
                                  "actions": [{"type": "raise", "event": "moved"}]}]},
                {"id": "b"}
            ]
        })))
        .unwrap();

        let m = table.root();
        let a = m.state_by_name("a").unwrap();
        assert!(a.on_entry.is_some());
        assert!(a.on_exit.is_some());
        assert!(m.transitions[0].on_transition.is_some());
    }

    #[test]
    fn test_nested_machines_flattened() {
        let table = compile(&chart(json!({
            "name": "parent",
            "states": [{"id": "a", "invoke": [
                {"id": "kid", "content": {
                    "name": "child",
                    "states": [{"id": "c1", "invoke": [
                        {"content": {"name": "grandchild", "states": [{"id": "g1"}]}}
                    ]}]
                }}
            ]}]
        })))
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.machines[0].name.as_deref(), Some("parent"));
        assert_eq!(table.machines[1].name.as_deref(), Some("child"));
        assert_eq!(table.machines[2].name.as_deref(), Some("grandchild"));
        assert_eq!(table.machines[1].parent, Some(0));
        assert_eq!(table.machines[2].parent, Some(1));

        // The invoke record points at its compiled machine.
        assert_eq!(table.machines[0].invokes[0].machine, Some(1));
        assert_eq!(table.machines[1].invokes[0].machine, Some(2));
    }

    #[test]
    fn test_foreign_invoke_type_not_compiled() {
        let table = compile(&chart(json!({
            "states": [{"id": "a", "invoke": [
                {"invoke_type": "http://example.com/vm", "src": "whatever"}
            ]}]
        })))
        .unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.root().invokes[0].machine.is_none());
    }

    #[test]
    fn test_src_without_resolver_fails() {
        let err = compile(&chart(json!({
            "states": [{"id": "a", "invoke": [{"src": "child.json"}]}]
        })))
        .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedSrc { .. }));
    }

    #[test]
    fn test_src_with_resolver() {
        struct Fixed;
        impl ChartResolver for Fixed {
            fn resolve(&self, _src: &str) -> Result<ChartDoc, CompileError> {
                Ok(ChartDoc::from_json(&json!({
                    "name": "fetched",
                    "states": [{"id": "only"}]
                }))
                .unwrap())
            }
        }

        let table = Compiler::with_resolver(&Fixed)
            .compile(&chart(json!({
                "states": [{"id": "a", "invoke": [{"src": "child.json"}]}]
            })))
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.machines[1].name.as_deref(), Some("fetched"));
    }

    #[test]
    fn test_history_needs_exactly_one_default() {
        let err = compile(&chart(json!({
            "states": [{"id": "c", "states": [
                {"kind": "history", "id": "h"},
                {"id": "a"}
            ]}]
        })))
        .unwrap_err();
        assert!(matches!(err, CompileError::DefaultTransition { .. }));

        let err = compile(&chart(json!({
            "states": [{"id": "c", "states": [
                {"kind": "history", "id": "h", "transitions": [
                    {"target": ["a"]},
                    {"target": ["a"]}
                ]},
                {"id": "a"}
            ]}]
        })))
        .unwrap_err();
        assert!(matches!(err, CompileError::DefaultTransition { .. }));
    }

    #[test]
    fn test_initial_default_must_be_plain() {
        let err = compile(&chart(json!({
            "states": [{"id": "c", "states": [
                {"kind": "initial", "transitions": [{"event": "e", "target": ["a"]}]},
                {"id": "a"}
            ]}]
        })))
        .unwrap_err();
        assert!(matches!(err, CompileError::DefaultTransition { .. }));
    }

    #[test]
    fn test_checksum_tracks_document_identity() {
        let a = compile(&chart(json!({"states": [{"id": "a"}]}))).unwrap();
        let b = compile(&chart(json!({"states": [{"id": "a"}]}))).unwrap();
        let c = compile(&chart(json!({"states": [{"id": "b"}]}))).unwrap();

        assert_eq!(a.root().checksum, b.root().checksum);
        assert_ne!(a.root().checksum, c.root().checksum);
    }

    #[test]
    fn test_table_serializes() {
        let table = compile(&chart(json!({
            "states": [
                {"id": "a", "transitions": [{"event": "e", "target": ["b"]}]},
                {"id": "b"}
            ]
        })))
        .unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let back: MachineTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.root().nr_states(), table.root().nr_states());
        assert_eq!(back.root().transitions[0].source, 1);
    }
}

//! Executable-content lowering.
//!
//! Turns the authored action trees into ordered callback programs and
//! fills the sidecar tables (`sends`, `invokes`, `foreachs`, `datas`,
//! `donedata`) they reference by index. Children of an entry, exit,
//! transition or finalize block concatenate in document order into one
//! program.

use crate::error::CompileError;
use crate::index::Indexed;
use rscxml_chart::{
    ActionNode, Binding, ChartDoc, InvokeContent, InvokeSpec, ParamSpec, SendSpec,
};
use rscxml_tables::{
    Action, DataSpan, ElemData, ElemDoneData, ElemForeach, ElemInvoke, ElemParam, ElemSend,
    IfArm, Program, ProgramId,
};

/// Per-state program references, patched into the state descriptors.
#[derive(Default, Clone)]
pub(crate) struct StatePrograms {
    pub on_entry: Option<ProgramId>,
    pub on_exit: Option<ProgramId>,
    pub invoke: Option<ProgramId>,
    pub data: Option<DataSpan>,
}

/// Where an invoke's nested machine comes from, aligned with the invoke
/// table; `None` for foreign invocation types.
pub(crate) enum NestedSource {
    Inline(Box<ChartDoc>),
    Src(String),
}

/// Everything the lowerer produces.
pub(crate) struct Lowered {
    pub programs: Vec<Program>,
    pub sends: Vec<ElemSend>,
    pub invokes: Vec<ElemInvoke>,
    pub foreachs: Vec<ElemForeach>,
    pub datas: Vec<ElemData>,
    pub donedata: Vec<ElemDoneData>,
    pub global_script: Option<ProgramId>,
    pub state_programs: Vec<StatePrograms>,
    pub trans_programs: Vec<Option<ProgramId>>,
    pub nested: Vec<Option<NestedSource>>,
}

/// Lowers every executable-content block of the indexed chart.
pub(crate) fn lower(doc: &ChartDoc, indexed: &Indexed<'_>) -> Result<Lowered, CompileError> {
    let mut lowerer = Lowerer::default();

    let mut state_programs = vec![StatePrograms::default(); indexed.nr_states()];
    for (i, entry) in indexed.states.iter().enumerate() {
        let programs = &mut state_programs[i];
        programs.on_entry = lowerer.lower_block_opt(entry.on_entry)?;
        programs.on_exit = lowerer.lower_block_opt(entry.on_exit)?;
        programs.invoke = lowerer.lower_invokes(entry.invoke)?;
        programs.data = lowerer.lower_data(entry);

        if let Some(dd) = entry.donedata {
            lowerer.donedata.push(ElemDoneData {
                source: i,
                content: dd.content.clone(),
                contentexpr: dd.contentexpr.clone(),
                params: lower_params(&dd.params),
            });
        }
    }

    // Early binding: every block belongs to the root, initialized on the
    // first step. Late binding keeps the per-state spans.
    if doc.binding == Binding::Early && !lowerer.datas.is_empty() {
        for programs in state_programs.iter_mut() {
            programs.data = None;
        }
        state_programs[0].data = Some(DataSpan {
            first: 0,
            count: lowerer.datas.len(),
        });
    }

    let mut trans_programs = Vec::with_capacity(indexed.transitions.len());
    for entry in &indexed.transitions {
        trans_programs.push(lowerer.lower_block_opt(&entry.node.actions)?);
    }

    // Root scripts concatenate into one global-script program.
    let global_script = lowerer.lower_block_opt(&doc.scripts)?;

    Ok(Lowered {
        programs: lowerer.programs,
        sends: lowerer.sends,
        invokes: lowerer.invokes,
        foreachs: lowerer.foreachs,
        datas: lowerer.datas,
        donedata: lowerer.donedata,
        global_script,
        state_programs,
        trans_programs,
        nested: lowerer.nested,
    })
}

#[derive(Default)]
struct Lowerer {
    programs: Vec<Program>,
    sends: Vec<ElemSend>,
    invokes: Vec<ElemInvoke>,
    foreachs: Vec<ElemForeach>,
    datas: Vec<ElemData>,
    donedata: Vec<ElemDoneData>,
    nested: Vec<Option<NestedSource>>,
}

impl Lowerer {
    fn push_program(&mut self, program: Program) -> ProgramId {
        self.programs.push(program);
        self.programs.len() - 1
    }

    /// Lowers a block to a program, or to nothing when it is empty.
    fn lower_block_opt(&mut self, actions: &[ActionNode]) -> Result<Option<ProgramId>, CompileError> {
        if actions.is_empty() {
            return Ok(None);
        }
        let program = self.lower_block(actions)?;
        Ok(Some(self.push_program(program)))
    }

    fn lower_block(&mut self, actions: &[ActionNode]) -> Result<Program, CompileError> {
        actions.iter().map(|a| self.lower_action(a)).collect()
    }

    fn lower_action(&mut self, action: &ActionNode) -> Result<Action, CompileError> {
        Ok(match action {
            ActionNode::Script { src, content } => Action::Script {
                src: src.clone(),
                content: content.clone(),
            },

            ActionNode::Log { label, expr } => Action::Log {
                label: label.clone(),
                expr: expr.clone(),
            },

            ActionNode::Raise { event } => Action::Raise {
                event: event.clone(),
            },

            ActionNode::Send(spec) => {
                let idx = self.sends.len();
                self.sends.push(lower_send(spec));
                Action::Send { send: idx }
            }

            ActionNode::Cancel { sendid, sendidexpr } => Action::Cancel {
                sendid: sendid.clone(),
                sendidexpr: sendidexpr.clone(),
            },

            ActionNode::Assign {
                location,
                expr,
                content,
            } => Action::Assign {
                location: location.clone(),
                // An inline value stands in for the expression.
                expr: expr.clone().or_else(|| content.clone()),
            },

            ActionNode::Foreach {
                array,
                item,
                index,
                body,
            } => {
                let idx = self.foreachs.len();
                self.foreachs.push(ElemForeach {
                    array: array.clone(),
                    item: item.clone(),
                    index: index.clone(),
                });
                Action::Foreach {
                    foreach: idx,
                    body: self.lower_block(body)?,
                }
            }

            ActionNode::If {
                cond,
                then,
                elif,
                otherwise,
            } => {
                let mut arms = vec![IfArm {
                    cond: Some(cond.clone()),
                    body: self.lower_block(then)?,
                }];
                for arm in elif {
                    arms.push(IfArm {
                        cond: Some(arm.cond.clone()),
                        body: self.lower_block(&arm.body)?,
                    });
                }
                if !otherwise.is_empty() {
                    arms.push(IfArm {
                        cond: None,
                        body: self.lower_block(otherwise)?,
                    });
                }
                Action::If { arms }
            }
        })
    }

    /// Lowers a state's invoke elements: one sidecar record each plus an
    /// invoke program dispatching them in order.
    fn lower_invokes(&mut self, specs: &[InvokeSpec]) -> Result<Option<ProgramId>, CompileError> {
        if specs.is_empty() {
            return Ok(None);
        }
        let mut program = Program::new();
        for spec in specs {
            let finalize = self.lower_block_opt(&spec.finalize)?;
            let idx = self.invokes.len();
            self.invokes.push(lower_invoke(spec, finalize));
            self.nested.push(nested_source(spec));
            program.push(Action::Invoke { invoke: idx });
        }
        Ok(Some(self.push_program(program)))
    }

    fn lower_data(&mut self, entry: &crate::index::StateEntry<'_>) -> Option<DataSpan> {
        if entry.data.is_empty() {
            return None;
        }
        let first = self.datas.len();
        for spec in entry.data {
            self.datas.push(ElemData {
                id: spec.id.clone(),
                src: spec.src.clone(),
                expr: spec.expr.clone(),
                content: spec.content.clone(),
            });
        }
        Some(DataSpan {
            first,
            count: entry.data.len(),
        })
    }
}

fn lower_params(params: &[ParamSpec]) -> Vec<ElemParam> {
    params
        .iter()
        .map(|p| ElemParam {
            name: p.name.clone(),
            expr: p.expr.clone(),
            location: p.location.clone(),
        })
        .collect()
}

fn lower_send(spec: &SendSpec) -> ElemSend {
    ElemSend {
        event: spec.event.clone(),
        eventexpr: spec.eventexpr.clone(),
        target: spec.target.clone(),
        targetexpr: spec.targetexpr.clone(),
        type_: spec.send_type.clone(),
        typeexpr: spec.typeexpr.clone(),
        id: spec.id.clone(),
        idlocation: spec.idlocation.clone(),
        delay: spec.delay.clone(),
        delayexpr: spec.delayexpr.clone(),
        namelist: spec.namelist.clone(),
        content: spec.content.clone(),
        contentexpr: spec.contentexpr.clone(),
        params: lower_params(&spec.params),
    }
}

fn lower_invoke(spec: &InvokeSpec, finalize: Option<ProgramId>) -> ElemInvoke {
    let content_text = match &spec.content {
        Some(InvokeContent::Text(text)) => Some(text.clone()),
        _ => None,
    };
    ElemInvoke {
        machine: None,
        type_: spec.invoke_type.clone(),
        typeexpr: spec.typeexpr.clone(),
        src: spec.src.clone(),
        srcexpr: spec.srcexpr.clone(),
        id: spec.id.clone(),
        idlocation: spec.idlocation.clone(),
        namelist: spec.namelist.clone(),
        autoforward: spec.autoforward,
        params: lower_params(&spec.params),
        finalize,
        content: content_text,
        contentexpr: None,
    }
}

/// Selects the nested-machine source of an invoke, when its type is the
/// statechart family.
fn nested_source(spec: &InvokeSpec) -> Option<NestedSource> {
    let scxml_kind = match spec.invoke_type.as_deref() {
        None | Some("scxml") => true,
        Some(uri) => uri == rscxml_chart::SCXML_INVOKE_URI,
    };
    if !scxml_kind {
        return None;
    }
    match (&spec.content, &spec.src) {
        (Some(InvokeContent::Chart(chart)), _) => Some(NestedSource::Inline(chart.clone())),
        (_, Some(src)) => Some(NestedSource::Src(src.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::index;
    use rscxml_chart::resort;
    use serde_json::json;

    fn lowered(value: serde_json::Value) -> Lowered {
        let mut doc = ChartDoc::from_json(&value).unwrap();
        resort(&mut doc);
        let indexed = index(&doc).unwrap();
        lower(&doc, &indexed).unwrap()
    }

    #[test]
    fn test_entry_block_concatenates_in_order() {
        let out = lowered(json!({
            "states": [{"id": "a", "on_entry": [
                {"type": "log", "label": "one"},
                {"type": "raise", "event": "two"}
            ]}]
        }));

        let pid = out.state_programs[1].on_entry.unwrap();
        let program = &out.programs[pid];
        assert_eq!(program.len(), 2);
        assert!(matches!(program[0], Action::Log { .. }));
        assert!(matches!(program[1], Action::Raise { .. }));
        assert!(out.state_programs[1].on_exit.is_none());
    }

    #[test]
    fn test_send_and_foreach_sidecars() {
        let out = lowered(json!({
            "states": [{"id": "a", "on_entry": [
                {"type": "send", "event": "ping", "target": "#_internal"},
                {"type": "foreach", "array": "ctx.items", "item": "it",
                 "body": [{"type": "send", "eventexpr": "it"}]}
            ]}]
        }));

        assert_eq!(out.sends.len(), 2);
        assert_eq!(out.foreachs.len(), 1);
        assert_eq!(out.sends[0].event.as_deref(), Some("ping"));
        assert_eq!(out.foreachs[0].item, "it");

        let pid = out.state_programs[1].on_entry.unwrap();
        match &out.programs[pid][1] {
            Action::Foreach { foreach, body } => {
                assert_eq!(*foreach, 0);
                assert!(matches!(body[0], Action::Send { send: 1 }));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_if_arms_lowering() {
        let out = lowered(json!({
            "states": [{"id": "a", "on_entry": [
                {"type": "if", "cond": "ctx.a",
                 "then": [{"type": "log", "label": "a"}],
                 "elif": [{"cond": "ctx.b", "body": [{"type": "log", "label": "b"}]}],
                 "else": [{"type": "log", "label": "c"}]}
            ]}]
        }));

        let pid = out.state_programs[1].on_entry.unwrap();
        match &out.programs[pid][0] {
            Action::If { arms } => {
                assert_eq!(arms.len(), 3);
                assert_eq!(arms[0].cond.as_deref(), Some("ctx.a"));
                assert_eq!(arms[1].cond.as_deref(), Some("ctx.b"));
                assert!(arms[2].cond.is_none());
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_assign_content_falls_back_to_expr() {
        let out = lowered(json!({
            "states": [{"id": "a", "on_entry": [
                {"type": "assign", "location": "ctx.x", "content": "42"}
            ]}]
        }));
        let pid = out.state_programs[1].on_entry.unwrap();
        match &out.programs[pid][0] {
            Action::Assign { location, expr } => {
                assert_eq!(location, "ctx.x");
                assert_eq!(expr.as_deref(), Some("42"));
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_early_binding_moves_data_to_root() {
        let out = lowered(json!({
            "binding": "early",
            "states": [
                {"id": "a", "data": [{"id": "x", "expr": "1"}]},
                {"id": "b", "data": [{"id": "y", "expr": "2"}]}
            ]
        }));

        assert_eq!(out.datas.len(), 2);
        assert_eq!(
            out.state_programs[0].data,
            Some(DataSpan { first: 0, count: 2 })
        );
        assert!(out.state_programs[1].data.is_none());
        assert!(out.state_programs[2].data.is_none());
    }

    #[test]
    fn test_late_binding_keeps_spans() {
        let out = lowered(json!({
            "binding": "late",
            "states": [
                {"id": "a", "data": [{"id": "x", "expr": "1"}]},
                {"id": "b", "data": [{"id": "y", "expr": "2"}, {"id": "z"}]}
            ]
        }));

        assert_eq!(
            out.state_programs[1].data,
            Some(DataSpan { first: 0, count: 1 })
        );
        assert_eq!(
            out.state_programs[2].data,
            Some(DataSpan { first: 1, count: 2 })
        );
        assert!(out.state_programs[0].data.is_none());
    }

    #[test]
    fn test_invoke_program_and_nested_sources() {
        let out = lowered(json!({
            "states": [{"id": "a", "invoke": [
                {"id": "child", "content": {"states": [{"id": "only"}]},
                 "finalize": [{"type": "log", "label": "back"}]},
                {"invoke_type": "http://example.com/other", "src": "ext"}
            ]}]
        }));

        assert_eq!(out.invokes.len(), 2);
        assert!(out.invokes[0].finalize.is_some());
        assert!(matches!(out.nested[0], Some(NestedSource::Inline(_))));
        assert!(out.nested[1].is_none());

        let pid = out.state_programs[1].invoke.unwrap();
        assert!(matches!(out.programs[pid][0], Action::Invoke { invoke: 0 }));
        assert!(matches!(out.programs[pid][1], Action::Invoke { invoke: 1 }));
    }

    #[test]
    fn test_global_script_concatenation() {
        let out = lowered(json!({
            "scripts": [
                {"type": "script", "content": "init()"},
                {"type": "script", "content": "more()"}
            ],
            "states": [{"id": "a"}]
        }));

        let pid = out.global_script.unwrap();
        assert_eq!(out.programs[pid].len(), 2);
    }

    #[test]
    fn test_donedata_records() {
        let out = lowered(json!({
            "states": [
                {"id": "c", "states": [
                    {"kind": "final", "id": "f", "donedata": {
                        "contentexpr": "ctx.result",
                        "params": [{"name": "n", "expr": "1"}]
                    }}
                ]}
            ]
        }));

        assert_eq!(out.donedata.len(), 1);
        let dd = &out.donedata[0];
        assert_eq!(dd.source, 2);
        assert_eq!(dd.contentexpr.as_deref(), Some("ctx.result"));
        assert_eq!(dd.params.len(), 1);
    }
}

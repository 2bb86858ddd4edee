//! The step function.
//!
//! One call advances the context by exactly one macro-step: event
//! acquisition, transition selection with conflict resolution, history
//! capture, entry-set expansion, exits, transition actions, entries,
//! done events and the invocation lifecycle. The phases are the arms of
//! a stage-labelled loop, entered at `EstablishEntrySet` for the first
//! step of a pristine context and at `SelectTransitions` otherwise.

use crate::context::{
    Context, CTX_INITIALIZED, CTX_PRISTINE, CTX_SPONTANEOUS, CTX_TOP_LEVEL_FINAL,
    CTX_TRANSITION_FOUND,
};
use crate::error::KernelError;
use crate::exec::run_program;
use crate::host::Host;
use rscxml_tables::{MachineDesc, StateKind};

/// The canonical stages of a macro-step.
enum Stage {
    SelectTransitions,
    RememberHistory,
    EstablishEntrySet,
    ExitStates,
    TakeTransitions,
    EnterStates,
}

/// Advances `ctx` by one macro-step.
///
/// Returns `Err(Done)` once a top-level final state has been reached.
/// Callback errors propagate immediately and leave the context
/// observably mid-step; callers treat them as fatal and discard the
/// context.
pub fn step<H: Host>(
    machine: &MachineDesc,
    ctx: &mut Context,
    host: &mut H,
) -> Result<(), KernelError> {
    if ctx.flags & CTX_TOP_LEVEL_FINAL != 0 {
        return Err(KernelError::Done);
    }

    tracing::trace!(config = ?ctx.active_names(machine), "step");

    let n_states = machine.nr_states();

    let mut conflicts = machine.trans_bits();
    let mut trans_set = machine.trans_bits();
    let mut target_set = machine.state_bits();
    let mut exit_set = machine.state_bits();
    let mut entry_set = machine.state_bits();
    let mut tmp_states = machine.state_bits();

    let mut event: Option<H::Event> = None;

    let mut stage = if ctx.flags == CTX_PRISTINE {
        // First step: run the global script, seed the entry set with the
        // root completion, and skip straight to entry expansion.
        if let Some(pid) = machine.global_script {
            run_program(machine, pid, &machine.states[0], host, false)?;
        }
        target_set.or(&machine.states[0].completion);
        ctx.flags |= CTX_SPONTANEOUS | CTX_INITIALIZED;
        Stage::EstablishEntrySet
    } else {
        // A pending spontaneous pass retries without dequeuing.
        if ctx.flags & CTX_SPONTANEOUS == 0 {
            event = host.dequeue_internal();
            if event.is_none() {
                // The internal queue is drained; settle invocations
                // before looking outside.
                manage_invocations(machine, ctx, host)?;
                event = host.dequeue_external();
                // With no event at all, only spontaneous transitions can
                // be enabled below.
            }
        }
        host.event_selected(event.as_ref());
        Stage::SelectTransitions
    };

    loop {
        stage = match stage {
            Stage::SelectTransitions => {
                conflicts.clear_all();
                exit_set.clear_all();
                for (i, transition) in machine.transitions.iter().enumerate() {
                    // History and initial transitions are taken by entry
                    // expansion, never selected here.
                    if transition.flags.is_default_entry() {
                        continue;
                    }
                    if !ctx.config.has(transition.source) {
                        continue;
                    }
                    if conflicts.has(i) {
                        continue;
                    }
                    if host.is_enabled(transition, event.as_ref())? {
                        ctx.flags |= CTX_TRANSITION_FOUND;
                        conflicts.or(&transition.conflicts);
                        target_set.or(&transition.target);
                        exit_set.or(&transition.exit_set);
                        trans_set.set(i);
                    }
                }
                exit_set.and(&ctx.config);

                if ctx.flags & CTX_TRANSITION_FOUND != 0 {
                    ctx.flags |= CTX_SPONTANEOUS;
                    ctx.flags &= !CTX_TRANSITION_FOUND;
                } else {
                    ctx.flags &= !CTX_SPONTANEOUS;
                }

                tracing::trace!(
                    selected = trans_set.count(),
                    exiting = exit_set.count(),
                    "transitions selected"
                );
                Stage::RememberHistory
            }

            Stage::RememberHistory => {
                for state in &machine.states {
                    if !state.kind.is_history() {
                        continue;
                    }
                    // A history state whose parent is about to be exited
                    // captures the active part of its completion.
                    if exit_set.has(state.parent) {
                        tmp_states.copy_from(&state.completion);
                        tmp_states.and(&ctx.config);
                        ctx.history.and_not(&state.completion);
                        ctx.history.or(&tmp_states);
                    }
                }
                Stage::EstablishEntrySet
            }

            Stage::EstablishEntrySet => {
                entry_set.copy_from(&target_set);

                for i in 0..n_states {
                    if entry_set.has(i) {
                        entry_set.or(&machine.states[i].ancestors);
                    }
                }

                for i in 0..n_states {
                    if !entry_set.has(i) {
                        continue;
                    }
                    let state = &machine.states[i];
                    match state.kind {
                        StateKind::Parallel => {
                            entry_set.or(&state.completion);
                        }

                        StateKind::HistoryShallow | StateKind::HistoryDeep => {
                            if !state.completion.intersects(&ctx.history)
                                && !ctx.config.has(state.parent)
                            {
                                // Nothing captured yet: take the single
                                // default transition.
                                for (j, transition) in machine.transitions.iter().enumerate() {
                                    if transition.source != i {
                                        continue;
                                    }
                                    entry_set.or(&transition.target);
                                    if state.kind == StateKind::HistoryDeep
                                        && !transition.target.intersects(&state.children)
                                    {
                                        if let Some(k) =
                                            (i + 1..n_states).find(|&k| transition.target.has(k))
                                        {
                                            entry_set.or(&machine.states[k].ancestors);
                                        }
                                    }
                                    trans_set.set(j);
                                    break;
                                }
                            } else {
                                tmp_states.copy_from(&state.completion);
                                tmp_states.and(&ctx.history);
                                entry_set.or(&tmp_states);
                                if state.kind == StateKind::HistoryDeep && state.has_history {
                                    // Restored regions may hold nested
                                    // histories of their own.
                                    for j in i + 1..n_states {
                                        if state.completion.has(j)
                                            && entry_set.has(j)
                                            && machine.states[j].has_history
                                        {
                                            for k in j + 1..n_states {
                                                if machine.states[k].kind.is_history()
                                                    && machine.states[j].children.has(k)
                                                {
                                                    entry_set.set(k);
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }

                        StateKind::Initial => {
                            for (j, transition) in machine.transitions.iter().enumerate() {
                                if transition.source != i {
                                    continue;
                                }
                                trans_set.set(j);
                                entry_set.clear(i);
                                entry_set.or(&transition.target);
                                for k in i + 1..n_states {
                                    if transition.target.has(k) {
                                        entry_set.or(&machine.states[k].ancestors);
                                    }
                                }
                            }
                        }

                        StateKind::Compound => {
                            // Complete only when no child is already
                            // coming in, and the state is freshly entered
                            // or about to lose its active child.
                            if !entry_set.intersects(&state.children)
                                && (!ctx.config.intersects(&state.children)
                                    || exit_set.intersects(&state.children))
                            {
                                entry_set.or(&state.completion);
                                if !state.completion.intersects(&state.children) {
                                    // Completion names a deeper descendant;
                                    // pull in its ancestor chain.
                                    if let Some(j) =
                                        (i + 1..n_states).find(|&j| state.completion.has(j))
                                    {
                                        entry_set.or(&machine.states[j].ancestors);
                                    }
                                }
                            }
                        }

                        StateKind::Atomic | StateKind::Final => {}
                    }
                }

                Stage::ExitStates
            }

            Stage::ExitStates => {
                for i in (0..n_states).rev() {
                    if exit_set.has(i) && ctx.config.has(i) {
                        if let Some(pid) = machine.states[i].on_exit {
                            run_program(machine, pid, &machine.states[i], host, false)?;
                        }
                        ctx.config.clear(i);
                    }
                }
                Stage::TakeTransitions
            }

            Stage::TakeTransitions => {
                for (i, transition) in machine.transitions.iter().enumerate() {
                    if trans_set.has(i) && !transition.flags.is_default_entry() {
                        if let Some(pid) = transition.on_transition {
                            run_program(
                                machine,
                                pid,
                                &machine.states[transition.source],
                                host,
                                false,
                            )?;
                        }
                    }
                }
                Stage::EnterStates
            }

            Stage::EnterStates => {
                for i in 0..n_states {
                    if !entry_set.has(i) || ctx.config.has(i) {
                        continue;
                    }
                    let state = &machine.states[i];
                    if state.kind.is_pseudo() {
                        continue;
                    }

                    ctx.config.set(i);

                    if !ctx.initialized_data.has(i) {
                        if let Some(span) = state.data {
                            for d in span.first..span.first + span.count {
                                let data =
                                    machine.datas.get(d).ok_or(KernelError::InvalidTarget {
                                        index: d,
                                        table: "datas",
                                    })?;
                                host.exec_content_init(data)?;
                            }
                        }
                        ctx.initialized_data.set(i);
                    }

                    if let Some(pid) = state.on_entry {
                        run_program(machine, pid, state, host, false)?;
                    }

                    // Actions of history and initial transitions run when
                    // their parent is entered.
                    for (j, transition) in machine.transitions.iter().enumerate() {
                        if trans_set.has(j)
                            && transition.flags.is_default_entry()
                            && machine.states[transition.source].parent == i
                        {
                            if let Some(pid) = transition.on_transition {
                                run_program(machine, pid, state, host, false)?;
                            }
                        }
                    }

                    if state.kind == StateKind::Final {
                        if state.ancestors.count() == 1 && state.ancestors.has(0) {
                            ctx.flags |= CTX_TOP_LEVEL_FINAL;
                        } else {
                            let donedata = machine.find_donedata(i);
                            host.raise_done_event(&machine.states[state.parent], donedata)?;
                        }

                        // Did this final complete an ancestor parallel?
                        // Collect the parallel's live non-final coverage;
                        // empty means every region has finished.
                        for j in 0..n_states {
                            if machine.states[j].kind != StateKind::Parallel
                                || !state.ancestors.has(j)
                            {
                                continue;
                            }
                            tmp_states.clear_all();
                            for k in 0..n_states {
                                if machine.states[k].ancestors.has(j) && ctx.config.has(k) {
                                    if machine.states[k].kind == StateKind::Final {
                                        tmp_states.and_not(&machine.states[k].ancestors);
                                    } else {
                                        tmp_states.set(k);
                                    }
                                }
                            }
                            if !tmp_states.any() {
                                host.raise_done_event(&machine.states[j], None)?;
                            }
                        }
                    }
                }
                break;
            }
        };
    }

    Ok(())
}

/// Invocation lifecycle: uninvoke states that left the configuration,
/// invoke states that entered it.
fn manage_invocations<H: Host>(
    machine: &MachineDesc,
    ctx: &mut Context,
    host: &mut H,
) -> Result<(), KernelError> {
    for (i, state) in machine.states.iter().enumerate() {
        if ctx.invocations.has(i) && !ctx.config.has(i) {
            if let Some(pid) = state.invoke {
                run_program(machine, pid, state, host, true)?;
            }
            ctx.invocations.clear(i);
        }
        if ctx.config.has(i) && !ctx.invocations.has(i) {
            if let Some(pid) = state.invoke {
                run_program(machine, pid, state, host, false)?;
            }
            ctx.invocations.set(i);
        }
    }
    Ok(())
}

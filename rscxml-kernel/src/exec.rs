//! Program interpreter.
//!
//! Runs a lowered callback program against the host. Any non-OK result
//! aborts the program and propagates out of the step.

use crate::error::KernelError;
use crate::host::Host;
use rscxml_tables::{Action, MachineDesc, Program, ProgramId, StateDesc};

/// Runs the program `pid` for `state`. `uninvoke` is forwarded to
/// invoke actions and ignored by everything else.
pub(crate) fn run_program<H: Host>(
    machine: &MachineDesc,
    pid: ProgramId,
    state: &StateDesc,
    host: &mut H,
    uninvoke: bool,
) -> Result<(), KernelError> {
    let program = machine.programs.get(pid).ok_or(KernelError::InvalidTarget {
        index: pid,
        table: "programs",
    })?;
    run_actions(machine, program, state, host, uninvoke)
}

fn run_actions<H: Host>(
    machine: &MachineDesc,
    program: &Program,
    state: &StateDesc,
    host: &mut H,
    uninvoke: bool,
) -> Result<(), KernelError> {
    for action in program {
        match action {
            Action::Script { src, content } => {
                host.exec_content_script(src.as_deref(), content.as_deref())?;
            }

            Action::Log { label, expr } => {
                host.exec_content_log(label.as_deref(), expr.as_deref())?;
            }

            Action::Raise { event } => {
                host.exec_content_raise(event)?;
            }

            Action::Send { send } => {
                let elem = machine.sends.get(*send).ok_or(KernelError::InvalidTarget {
                    index: *send,
                    table: "sends",
                })?;
                host.exec_content_send(elem)?;
            }

            Action::Cancel { sendid, sendidexpr } => {
                host.exec_content_cancel(sendid.as_deref(), sendidexpr.as_deref())?;
            }

            Action::Assign { location, expr } => {
                host.exec_content_assign(location, expr.as_deref())?;
            }

            Action::Foreach { foreach, body } => {
                let elem = machine
                    .foreachs
                    .get(*foreach)
                    .ok_or(KernelError::InvalidTarget {
                        index: *foreach,
                        table: "foreachs",
                    })?;
                host.exec_content_foreach_init(elem)?;
                while host.exec_content_foreach_next(elem)? {
                    run_actions(machine, body, state, host, uninvoke)?;
                }
                host.exec_content_foreach_done(elem)?;
            }

            Action::If { arms } => {
                for arm in arms {
                    let taken = match arm.cond.as_deref() {
                        Some(cond) => host.is_true(cond)?,
                        None => true,
                    };
                    if taken {
                        run_actions(machine, &arm.body, state, host, uninvoke)?;
                        break;
                    }
                }
            }

            Action::Invoke { invoke } => {
                let elem = machine
                    .invokes
                    .get(*invoke)
                    .ok_or(KernelError::InvalidTarget {
                        index: *invoke,
                        table: "invokes",
                    })?;
                host.invoke(state, elem, uninvoke)?;
            }
        }
    }
    Ok(())
}

//! The simulation facade.
//!
//! Owns a compiled machine table, a kernel context and a [`SimHost`],
//! and drives `step` the way an embedder would: until the machine is
//! done, or until no spontaneous pass is pending and both queues are
//! drained.

use crate::error::SimError;
use crate::event::Event;
use crate::host::SimHost;
use crate::trace::TraceEntry;
use rscxml_kernel::{step, Context, KernelError};
use rscxml_tables::{MachineDesc, MachineId, MachineTable};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No transition pending and no event queued; waiting for input.
    Stable,
    /// A top-level final state was reached.
    Done,
}

/// A running machine instance.
pub struct Simulation {
    table: MachineTable,
    machine: MachineId,
    ctx: Context,
    host: SimHost,
}

impl Simulation {
    /// Runs the top machine of `table`.
    pub fn new(table: MachineTable) -> Self {
        Self::with_host(table, SimHost::new())
    }

    /// Runs the top machine with a prepared host (seeded datamodel,
    /// pre-queued events).
    pub fn with_host(table: MachineTable, host: SimHost) -> Self {
        let ctx = Context::new(table.root());
        Self {
            table,
            machine: 0,
            ctx,
            host,
        }
    }

    /// The machine being stepped.
    pub fn machine(&self) -> &MachineDesc {
        &self.table.machines[self.machine]
    }

    /// The whole table, nested machines included.
    pub fn table(&self) -> &MachineTable {
        &self.table
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn host(&self) -> &SimHost {
        &self.host
    }

    /// Queues an external event.
    pub fn post(&mut self, event: Event) {
        self.host.post(event);
    }

    /// One macro-step.
    pub fn step(&mut self) -> Result<(), KernelError> {
        let machine = &self.table.machines[self.machine];
        step(machine, &mut self.ctx, &mut self.host)
    }

    /// Steps until done or quiescent: a step returned OK with no
    /// spontaneous pass pending and both queues empty.
    pub fn run_to_quiescence(&mut self, max_steps: usize) -> Result<RunOutcome, SimError> {
        for _ in 0..max_steps {
            match self.step() {
                Ok(()) => {
                    if !self.ctx.spontaneous() && self.host.queues_empty() {
                        return Ok(RunOutcome::Stable);
                    }
                }
                Err(KernelError::Done) => return Ok(RunOutcome::Done),
                Err(err) => return Err(err.into()),
            }
        }
        Err(SimError::StepLimit { limit: max_steps })
    }

    /// Posts `event` and runs to quiescence.
    pub fn apply(&mut self, event: Event, max_steps: usize) -> Result<RunOutcome, SimError> {
        self.post(event);
        self.run_to_quiescence(max_steps)
    }

    /// Names of the active states, document order.
    pub fn active_names(&self) -> Vec<String> {
        self.ctx.active_names(self.machine())
    }

    pub fn is_done(&self) -> bool {
        self.ctx.is_done()
    }

    /// The recorded action trace.
    pub fn trace(&self) -> &[TraceEntry] {
        self.host.trace()
    }
}

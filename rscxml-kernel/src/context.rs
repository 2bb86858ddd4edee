//! Runtime context of one machine instance.

use rscxml_tables::{BitSet, MachineDesc};

/// Context never stepped.
pub const CTX_PRISTINE: u8 = 0x00;
/// A spontaneous pass is pending; also: the current pass has no event.
pub const CTX_SPONTANEOUS: u8 = 0x01;
/// The first entry set has been applied.
pub const CTX_INITIALIZED: u8 = 0x02;
/// Terminal absorbing state: a top-level final was entered.
pub const CTX_TOP_LEVEL_FINAL: u8 = 0x04;
/// Scratch flag within a step: some transition was selected.
pub const CTX_TRANSITION_FOUND: u8 = 0x08;

/// The mutable state of one running machine.
///
/// The static tables stay in [`MachineDesc`]; a context holds only what
/// the stepper mutates, so contexts of the same machine can share one
/// table.
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) flags: u8,

    /// Currently active states.
    pub config: BitSet,

    /// Most recent active descendants, captured when a state with
    /// history is exited.
    pub history: BitSet,

    /// States with a live invocation.
    pub invocations: BitSet,

    /// States whose data blocks have been initialized at least once
    /// (late binding).
    pub initialized_data: BitSet,
}

impl Context {
    /// A pristine context for `machine`.
    pub fn new(machine: &MachineDesc) -> Self {
        Self {
            flags: CTX_PRISTINE,
            config: machine.state_bits(),
            history: machine.state_bits(),
            invocations: machine.state_bits(),
            initialized_data: machine.state_bits(),
        }
    }

    /// The raw flag byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// True before the first step.
    pub fn is_pristine(&self) -> bool {
        self.flags == CTX_PRISTINE
    }

    /// True once the first entry set has been applied.
    pub fn is_initialized(&self) -> bool {
        self.flags & CTX_INITIALIZED != 0
    }

    /// True once a top-level final state was reached; every further
    /// step returns `Done`.
    pub fn is_done(&self) -> bool {
        self.flags & CTX_TOP_LEVEL_FINAL != 0
    }

    /// The spontaneous bit carries two meanings: after a step, another
    /// event-less pass is pending; during a step, the pass in progress
    /// dequeued no event.
    pub fn spontaneous(&self) -> bool {
        self.flags & CTX_SPONTANEOUS != 0
    }

    /// Names of the active states, document order; anonymous states
    /// print as `#index`.
    pub fn active_names(&self, machine: &MachineDesc) -> Vec<String> {
        self.config
            .iter()
            .map(|i| match machine.states.get(i).and_then(|s| s.name.as_deref()) {
                Some(name) => name.to_string(),
                None => format!("#{}", i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> MachineDesc {
        MachineDesc {
            name: None,
            datamodel: None,
            checksum: "0".repeat(8),
            parent: None,
            states: vec![],
            transitions: vec![],
            donedata: vec![],
            datas: vec![],
            sends: vec![],
            invokes: vec![],
            foreachs: vec![],
            programs: vec![],
            global_script: None,
        }
    }

    #[test]
    fn test_fresh_context_is_pristine() {
        let ctx = Context::new(&machine());
        assert!(ctx.is_pristine());
        assert!(!ctx.is_initialized());
        assert!(!ctx.is_done());
        assert!(!ctx.spontaneous());
        assert!(!ctx.config.any());
    }

    #[test]
    fn test_flag_bits() {
        let mut ctx = Context::new(&machine());
        ctx.flags |= CTX_SPONTANEOUS | CTX_INITIALIZED;
        assert!(ctx.spontaneous());
        assert!(ctx.is_initialized());
        assert!(!ctx.is_pristine());
        ctx.flags |= CTX_TOP_LEVEL_FINAL;
        assert!(ctx.is_done());
        assert_eq!(ctx.flags() & CTX_TRANSITION_FOUND, 0);
    }
}

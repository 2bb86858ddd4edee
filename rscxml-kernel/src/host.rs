//! The host vtable.
//!
//! The kernel owns the step algorithm and nothing else. Everything with
//! observable effect - event queues, enabledness, the datamodel,
//! executable content, child machine invocations - is a callback on the
//! host. Required methods are the ones the kernel calls on every
//! machine; the rest default to [`KernelError::MissingCallback`], which
//! is what a chart gets when it uses an action its host does not
//! implement. The one exception is `exec_content_init`: an absent data
//! initializer is skipped, and the state is still marked initialized.

use crate::error::KernelError;
use rscxml_tables::{ElemData, ElemDoneData, ElemForeach, ElemInvoke, ElemSend, StateDesc, TransDesc};

/// Callbacks a host plugs into the kernel.
pub trait Host {
    /// Whatever the host queues; the kernel only moves it around.
    type Event;

    /// Pops the internal event queue.
    fn dequeue_internal(&mut self) -> Option<Self::Event>;

    /// Pops the external event queue.
    fn dequeue_external(&mut self) -> Option<Self::Event>;

    /// Decides whether `transition` is enabled for `event` (`None` on a
    /// spontaneous pass).
    fn is_enabled(
        &mut self,
        transition: &TransDesc,
        event: Option<&Self::Event>,
    ) -> Result<bool, KernelError>;

    /// Delivers a `done.state.*` event for `state`, with the matching
    /// donedata when the final state carried one.
    fn raise_done_event(
        &mut self,
        state: &StateDesc,
        donedata: Option<&ElemDoneData>,
    ) -> Result<(), KernelError>;

    /// Announces which event the current step processes, before
    /// transition selection. `None` on spontaneous passes.
    fn event_selected(&mut self, _event: Option<&Self::Event>) {}

    /// Evaluates a boolean datamodel expression.
    fn is_true(&mut self, _expr: &str) -> Result<bool, KernelError> {
        Err(KernelError::missing("is_true"))
    }

    /// Starts (`uninvoke == false`) or cancels (`uninvoke == true`) an
    /// invocation for `state`.
    fn invoke(
        &mut self,
        _state: &StateDesc,
        _invocation: &ElemInvoke,
        _uninvoke: bool,
    ) -> Result<(), KernelError> {
        Err(KernelError::missing("invoke"))
    }

    fn exec_content_log(
        &mut self,
        _label: Option<&str>,
        _expr: Option<&str>,
    ) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_log"))
    }

    fn exec_content_raise(&mut self, _event: &str) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_raise"))
    }

    fn exec_content_send(&mut self, _send: &ElemSend) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_send"))
    }

    fn exec_content_cancel(
        &mut self,
        _sendid: Option<&str>,
        _sendidexpr: Option<&str>,
    ) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_cancel"))
    }

    fn exec_content_assign(
        &mut self,
        _location: &str,
        _expr: Option<&str>,
    ) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_assign"))
    }

    fn exec_content_script(
        &mut self,
        _src: Option<&str>,
        _content: Option<&str>,
    ) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_script"))
    }

    /// Initializes one data block. Hosts without a datamodel may leave
    /// the default: the block is skipped, not an error.
    fn exec_content_init(&mut self, _data: &ElemData) -> Result<(), KernelError> {
        Ok(())
    }

    /// Prepares the foreach cursor.
    fn exec_content_foreach_init(&mut self, _foreach: &ElemForeach) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_foreach_init"))
    }

    /// Advances the cursor; `false` means exhausted (the FOREACH_DONE
    /// code of the table ABI).
    fn exec_content_foreach_next(&mut self, _foreach: &ElemForeach) -> Result<bool, KernelError> {
        Err(KernelError::missing("exec_content_foreach_next"))
    }

    /// Tears the cursor down.
    fn exec_content_foreach_done(&mut self, _foreach: &ElemForeach) -> Result<(), KernelError> {
        Err(KernelError::missing("exec_content_foreach_done"))
    }
}

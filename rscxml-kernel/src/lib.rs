//! # rscxml-kernel
//!
//! The interpreter kernel: a single deterministic `step` routine that
//! advances a statechart context by exactly one macro-step, consuming
//! only the compiled descriptor tables and a host-supplied callback
//! vtable. Event queues, guard evaluation, executable content and child
//! machine invocations all live behind the [`Host`] trait.
//!
//! The kernel is single-threaded and cooperative: all suspension happens
//! between `step` calls, a context is exclusively owned by its caller,
//! and parallel regions are logical parallelism resolved to bitset
//! unions inside one thread.

pub mod context;
pub mod error;
mod exec;
pub mod host;
pub mod step;

pub use context::{
    Context, CTX_INITIALIZED, CTX_PRISTINE, CTX_SPONTANEOUS, CTX_TOP_LEVEL_FINAL,
    CTX_TRANSITION_FOUND,
};
pub use error::KernelError;
pub use host::Host;
pub use step::step;

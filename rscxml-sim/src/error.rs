//! Simulation errors.

use rscxml_kernel::KernelError;
use thiserror::Error;

/// Errors from the simulation facade and its expression languages.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid guard expression: {reason}")]
    InvalidGuard { reason: String },

    #[error("machine did not settle within {limit} steps")]
    StepLimit { limit: usize },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

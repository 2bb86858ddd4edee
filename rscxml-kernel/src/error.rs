//! Kernel errors.

use rscxml_tables::StepCode;
use thiserror::Error;

/// Everything a `step` call or host callback can report.
///
/// `Done` and `Idle` are normal terminations; callback failures are
/// fatal to the context, which is left observably mid-step.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("machine reached a top-level final state")]
    Done,

    #[error("no enabled transition and no event to consume")]
    Idle,

    #[error("missing host callback '{name}'")]
    MissingCallback { name: &'static str },

    #[error("executable content failed: {reason}")]
    ExecContent { reason: String },

    #[error("descriptor index {index} out of range for table '{table}'")]
    InvalidTarget { index: usize, table: &'static str },

    #[error("invalid state type byte {raw:#04x}")]
    InvalidType { raw: u8 },

    #[error("unsupported operation: {reason}")]
    Unsupported { reason: String },
}

impl KernelError {
    /// The numeric code of this error in the table ABI.
    pub fn code(&self) -> StepCode {
        match self {
            KernelError::Done => StepCode::Done,
            KernelError::Idle => StepCode::Idle,
            KernelError::MissingCallback { .. } => StepCode::MissingCallback,
            KernelError::ExecContent { .. } => StepCode::ExecContent,
            KernelError::InvalidTarget { .. } => StepCode::InvalidTarget,
            KernelError::InvalidType { .. } => StepCode::InvalidType,
            KernelError::Unsupported { .. } => StepCode::Unsupported,
        }
    }

    /// Shorthand for an absent-callback failure.
    pub fn missing(name: &'static str) -> Self {
        KernelError::MissingCallback { name }
    }

    /// Shorthand for a failed executable-content action.
    pub fn exec(reason: impl Into<String>) -> Self {
        KernelError::ExecContent {
            reason: reason.into(),
        }
    }
}

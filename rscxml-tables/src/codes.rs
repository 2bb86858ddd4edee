//! Numeric step codes.
//!
//! These are part of the artifact contract: embedded ports of the kernel
//! exchange them as plain integers, so the numbering is fixed.

use serde::{Deserialize, Serialize};

/// Result code of a kernel step or host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StepCode {
    /// Step completed normally.
    Ok = 0,
    /// No enabled transition and no event to consume.
    Idle = 1,
    /// The machine reached a top-level final state.
    Done = 2,
    /// A lowered action needed a callback the host does not provide.
    MissingCallback = 3,
    /// The foreach cursor is exhausted.
    ForeachDone = 4,
    /// Executable content failed in the host.
    ExecContent = 5,
    /// A descriptor referenced a table slot that does not exist.
    InvalidTarget = 6,
    /// A state type byte decoded to no known type.
    InvalidType = 7,
    /// The operation is not supported by this build.
    Unsupported = 8,
}

impl StepCode {
    /// The numeric value of the code.
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_numbering() {
        assert_eq!(StepCode::Ok.value(), 0);
        assert_eq!(StepCode::Idle.value(), 1);
        assert_eq!(StepCode::Done.value(), 2);
        assert_eq!(StepCode::MissingCallback.value(), 3);
        assert_eq!(StepCode::ForeachDone.value(), 4);
        assert_eq!(StepCode::ExecContent.value(), 5);
        assert_eq!(StepCode::InvalidTarget.value(), 6);
        assert_eq!(StepCode::InvalidType.value(), 7);
        assert_eq!(StepCode::Unsupported.value(), 8);
    }
}

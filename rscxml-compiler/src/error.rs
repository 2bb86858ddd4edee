//! Compiler errors.

use thiserror::Error;

/// Errors raised while compiling a chart document.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("duplicate state id '{id}'")]
    DuplicateStateId { id: String },

    #[error("transition target '{id}' names no state")]
    UnknownTarget { id: String },

    #[error("initial attribute '{id}' names no state")]
    UnknownInitial { id: String },

    #[error("{kind} pseudo state '{state}' {reason}")]
    DefaultTransition {
        kind: &'static str,
        state: String,
        reason: String,
    },

    #[error("cannot resolve invoked chart '{src}': {reason}")]
    UnresolvedSrc { src: String, reason: String },

    #[error("chart error: {0}")]
    Chart(#[from] rscxml_chart::ChartError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

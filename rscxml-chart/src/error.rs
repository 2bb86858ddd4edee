//! Chart document errors.

use thiserror::Error;

/// Errors raised while reading a chart document.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("malformed chart document: {0}")]
    Json(#[from] serde_json::Error),
}

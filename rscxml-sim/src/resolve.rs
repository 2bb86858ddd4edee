//! Filesystem chart resolver.
//!
//! Resolves invoke `src` references against a base directory, so charts
//! on disk can invoke sibling chart files.

use rscxml_chart::ChartDoc;
use rscxml_compiler::{ChartResolver, CompileError};
use std::path::{Path, PathBuf};

/// Loads invoked charts from JSON files under a base directory.
#[derive(Debug, Clone)]
pub struct FsResolver {
    base: PathBuf,
}

impl FsResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Rooted at the directory containing `chart_path`.
    pub fn beside(chart_path: &Path) -> Self {
        Self {
            base: chart_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }
}

impl ChartResolver for FsResolver {
    fn resolve(&self, src: &str) -> Result<ChartDoc, CompileError> {
        let path = self.base.join(src);
        let text = std::fs::read_to_string(&path).map_err(|err| CompileError::UnresolvedSrc {
            src: src.to_string(),
            reason: format!("{}: {}", path.display(), err),
        })?;
        ChartDoc::from_str(&text).map_err(|err| CompileError::UnresolvedSrc {
            src: src.to_string(),
            reason: err.to_string(),
        })
    }
}

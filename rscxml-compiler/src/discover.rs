//! Nested-machine resolution.
//!
//! Invokes whose type is absent, `"scxml"` or the canonical URI compile
//! into sibling machines. Inline content is compiled directly; `src`
//! references go through a host-supplied resolver, since document
//! fetching is the embedder's business.

use crate::error::CompileError;
use rscxml_chart::ChartDoc;

/// Resolves an invoke `src` reference to a chart document.
pub trait ChartResolver {
    fn resolve(&self, src: &str) -> Result<ChartDoc, CompileError>;
}

/// The default resolver: rejects every `src` reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ChartResolver for NoResolver {
    fn resolve(&self, src: &str) -> Result<ChartDoc, CompileError> {
        Err(CompileError::UnresolvedSrc {
            src: src.to_string(),
            reason: "no chart resolver configured".to_string(),
        })
    }
}

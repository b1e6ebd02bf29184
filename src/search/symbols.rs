use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use super::context::{extract, ContextMargins};
use crate::error::{HostError, Result, SearchError};
use crate::host::{CandidateId, CodeModel, DocumentProvider, Navigator, SymbolIndex, Workspace};

/// A symbol declaration resolved to its enclosing function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolHit {
    /// Fully qualified name of the enclosing element.
    pub name: String,
    pub kind: String,
    pub file_path: String,
    /// First line of the enclosing element.
    pub line: u32,
    pub context: String,
}

/// Why a candidate was dropped.
#[derive(Debug, Error)]
enum ResolutionGap {
    #[error("navigation failed: {0}")]
    Navigation(HostError),
    #[error("no active document after navigation")]
    NoActiveDocument,
    #[error("active document has no selection")]
    NoSelection,
    #[error("no function encloses the declaration")]
    NoEnclosingFunction,
    #[error("context lines could not be read")]
    ContextUnavailable,
}

/// Looks `name` up in the host's index and resolves every candidate to the
/// function that declares it, in index order.
///
/// Candidates that cannot be resolved are dropped, so the result may be
/// shorter than the index's answer. Only a failing index lookup fails the call.
pub fn find_symbols<H>(host: &mut H, name: &str, context_lines: u32) -> Result<Vec<SymbolHit>>
where
    H: Workspace + SymbolIndex + Navigator + CodeModel + DocumentProvider + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(SearchError::InvalidRequest("symbol name is empty".to_string()));
    }
    if host.workspace_root().is_none() {
        return Err(SearchError::NoWorkspace);
    }

    let candidates = host.lookup(name, true)?;
    debug!("Symbol '{}': {} index candidates", name, candidates.len());

    let mut hits = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match resolve(host, candidate, context_lines) {
            Ok(hit) => hits.push(hit),
            Err(gap) => trace!(candidate = candidate.0, "dropping symbol candidate: {}", gap),
        }
    }
    debug!("Symbol '{}': {} resolved hits", name, hits.len());
    Ok(hits)
}

fn resolve<H>(host: &mut H, candidate: CandidateId, context_lines: u32) -> std::result::Result<SymbolHit, ResolutionGap>
where
    H: Navigator + CodeModel + DocumentProvider + ?Sized,
{
    host.go_to_declaration(candidate)
        .map_err(ResolutionGap::Navigation)?;
    let active = host.active_document().ok_or(ResolutionGap::NoActiveDocument)?;
    let cursor = host.selection().ok_or(ResolutionGap::NoSelection)?;
    let element = host
        .element_at(active.id, cursor)
        .ok_or(ResolutionGap::NoEnclosingFunction)?;

    // The window covers the whole element plus the margin on both sides.
    let span = element.end_line.saturating_sub(element.start_line);
    let margins = ContextMargins::new(context_lines, span.saturating_add(context_lines));
    let window = extract(&*host, active.id, element.start_line, margins)
        .ok_or(ResolutionGap::ContextUnavailable)?;

    Ok(SymbolHit {
        name: element.full_name,
        kind: element.kind.to_string(),
        file_path: active.path,
        line: element.start_line,
        context: window.text,
    })
}

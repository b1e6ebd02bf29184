//! Code-element outline of a workspace: namespaces, types, functions and
//! properties per file, nested by containment.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::host::fs::walk_files;
use crate::host::syntax::{self, OutlineEntry, SourceLanguage};
use crate::host::{ElementKind, FileFilter};

/// Nesting limit used when the caller does not pick one.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Outline of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutline {
    pub path: PathBuf,
    pub entries: Vec<OutlineEntry>,
}

/// Outlines every supported source file under `root` that passes `filter`.
/// Files without any code element are left out.
pub fn outline_workspace(root: &Path, filter: &FileFilter, max_depth: usize) -> Vec<FileOutline> {
    let mut outlines = Vec::new();
    for path in walk_files(root, true) {
        if !filter.matches(&path) {
            continue;
        }
        let Some(language) = SourceLanguage::from_path(&path) else {
            continue;
        };
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                debug!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let entries = syntax::outline(&source, language, max_depth);
        if !entries.is_empty() {
            outlines.push(FileOutline { path, entries });
        }
    }
    outlines
}

fn kind_label(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Namespace => "Namespace",
        ElementKind::Type => "Type",
        ElementKind::Function => "Function",
        ElementKind::Property => "Property",
    }
}

/// Renders entries as `- <Kind>: <name> (line: N)`, two spaces of indent per
/// nesting level.
pub fn render(entries: &[OutlineEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "{}- {}: {} (line: {})",
            "  ".repeat(entry.depth),
            kind_label(entry.kind),
            entry.full_name,
            entry.line
        );
    }
    out
}

//! Interfaces to the host engine that owns the symbol index, the find engine
//! and the document buffers.
//!
//! The host is stateful and not reentrant. Every call into it goes through an
//! [`AffinityGuard`] obtained from [`HostAffinity::enter`], which serializes all
//! host interaction across concurrent requests.

pub mod affinity;
pub mod document;
pub mod events;
pub mod fs;
pub mod matcher;
pub mod memory;
pub mod syntax;

use std::fmt;
use std::path::PathBuf;

use crate::error::HostError;

pub use affinity::{AffinityGuard, HostAffinity};
pub use document::TextDocument;
pub use events::{FindDone, FindDoneSubscription, FindEvents, FindOutcome};
pub use fs::FsHost;
pub use matcher::FileFilter;
pub use memory::MemoryHost;

/// Handle to a document opened by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u32);

/// Opaque handle to one result of a symbol index lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateId(pub usize);

/// Identifies one issued find operation in completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchId(pub u64);

/// A 1-based line/column position inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPoint {
    pub line: u32,
    pub column: u32,
}

impl TextPoint {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The document that currently has focus after a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub id: DocumentId,
    pub path: String,
}

/// Kind tag of a code element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Namespace,
    Type,
    Function,
    Property,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Namespace => "namespace",
            ElementKind::Type => "type",
            ElementKind::Function => "function",
            ElementKind::Property => "property",
        };
        f.write_str(name)
    }
}

/// A code element resolved by the host's code model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeElement {
    pub kind: ElementKind,
    pub full_name: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    /// 1-based, inclusive.
    pub end_line: u32,
}

/// How the find engine interprets the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSyntax {
    Literal,
    Regex,
}

/// Settings applied to the find engine before a search is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    pub query: String,
    /// Directory the search is rooted at.
    pub root: PathBuf,
    pub recursive: bool,
    pub match_case: bool,
    pub whole_word: bool,
    pub pattern: PatternSyntax,
    /// `;`-separated glob list, e.g. `*.h;*.cpp`.
    pub file_filter: String,
    /// Ask the engine to finish the search before `execute` returns.
    pub wait_for_completion: bool,
}

/// Result of issuing a find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindStatus {
    /// The results listing is already populated.
    Completed,
    /// The search continues in the background; a [`FindDone`] with this id
    /// is published on the engine's [`FindEvents`] when it finishes.
    Pending(SearchId),
}

/// Access to the host workspace (solution) lifecycle.
pub trait Workspace {
    /// Root directory of the open workspace, if any.
    fn workspace_root(&self) -> Option<PathBuf>;
}

/// The host's object/symbol index.
pub trait SymbolIndex {
    /// Looks up `name` and returns one handle per hit, in index order.
    fn lookup(&mut self, name: &str, whole_word: bool) -> Result<Vec<CandidateId>, HostError>;
}

/// "Go to declaration" navigation and the resulting editor state.
pub trait Navigator {
    fn go_to_declaration(&mut self, candidate: CandidateId) -> Result<(), HostError>;

    fn active_document(&self) -> Option<ActiveDocument>;

    /// Cursor position of the active document's selection.
    fn selection(&self) -> Option<TextPoint>;
}

/// The host's code model.
pub trait CodeModel {
    /// Innermost function-level element enclosing `point`, if any.
    fn element_at(&self, document: DocumentId, point: TextPoint) -> Option<CodeElement>;
}

/// The host's text-find engine and its results window.
#[cfg_attr(test, mockall::automock)]
pub trait FindEngine {
    fn configure(&mut self, options: FindOptions);

    fn execute(&mut self) -> Result<FindStatus, HostError>;

    /// Completion event stream shared by every search on this engine.
    fn find_events(&self) -> FindEvents;

    /// Full text of the results listing of the last search.
    fn results_listing(&mut self) -> Result<String, HostError>;
}

/// Document buffers.
pub trait DocumentProvider {
    fn open_or_get(&mut self, path: &str) -> Option<DocumentId>;

    /// Number of the last line; at least 1 for any open document.
    fn last_line(&self, document: DocumentId) -> Option<u32>;

    /// Literal text of lines `start..=end` (1-based).
    fn text_of_lines(&self, document: DocumentId, start: u32, end: u32) -> Option<String>;
}

/// Everything the search service needs from a host engine.
pub trait Host:
    Workspace + SymbolIndex + Navigator + CodeModel + FindEngine + DocumentProvider + Send + 'static
{
}

impl<T> Host for T where
    T: Workspace
        + SymbolIndex
        + Navigator
        + CodeModel
        + FindEngine
        + DocumentProvider
        + Send
        + 'static
{
}

//! In-memory host engine.
//!
//! Documents, declarations and code elements are registered up front. Useful
//! for embedding the search service without a real workspace and for tests
//! that need to script host behaviour, such as a canned results listing or a
//! failing index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::matcher::{FileFilter, LineMatcher, ListingWriter};
use super::{
    ActiveDocument, CandidateId, CodeElement, CodeModel, DocumentId, DocumentProvider, FindDone,
    FindEngine, FindEvents, FindOptions, FindOutcome, FindStatus, Navigator, SearchId,
    SymbolIndex, TextDocument, TextPoint, Workspace,
};
use crate::error::HostError;

#[derive(Debug, Clone)]
struct DeclaredSymbol {
    name: String,
    path: String,
    point: TextPoint,
}

#[derive(Default)]
pub struct MemoryHost {
    workspace_root: Option<PathBuf>,
    documents: Vec<TextDocument>,
    by_path: HashMap<String, DocumentId>,
    symbols: Vec<DeclaredSymbol>,
    elements: HashMap<String, Vec<CodeElement>>,
    candidates: Vec<DeclaredSymbol>,
    active: Option<DocumentId>,
    selection: Option<TextPoint>,
    listing_override: Option<String>,
    deferred_completion: bool,
    index_failure: Option<HostError>,
    find_failure: Option<HostError>,
    find_options: Option<FindOptions>,
    last_find_options: Option<FindOptions>,
    results: String,
    events: FindEvents,
    next_search_id: u64,
    find_count: usize,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Registers a document under `path`, replacing any previous text.
    pub fn add_document(&mut self, path: &str, text: &str) -> DocumentId {
        let document = TextDocument::new(path, text);
        if let Some(&id) = self.by_path.get(path) {
            self.documents[id.0 as usize] = document;
            return id;
        }
        let id = DocumentId(self.documents.len() as u32);
        self.documents.push(document);
        self.by_path.insert(path.to_string(), id);
        id
    }

    /// Adds an index entry for `name` whose declaration sits at `point` in `path`.
    pub fn declare_symbol(&mut self, name: &str, path: &str, point: TextPoint) {
        self.symbols.push(DeclaredSymbol {
            name: name.to_string(),
            path: path.to_string(),
            point,
        });
    }

    /// Adds a function-level code element to the code model of `path`.
    pub fn add_element(&mut self, path: &str, element: CodeElement) {
        self.elements.entry(path.to_string()).or_default().push(element);
    }

    /// Every search returns `listing` instead of scanning the documents.
    pub fn with_listing(mut self, listing: impl Into<String>) -> Self {
        self.listing_override = Some(listing.into());
        self
    }

    /// When set, searches that do not wait for completion report `Pending`
    /// and publish their completion from a separate task.
    pub fn with_deferred_completion(mut self, deferred: bool) -> Self {
        self.deferred_completion = deferred;
        self
    }

    pub fn fail_index(&mut self, error: HostError) {
        self.index_failure = Some(error);
    }

    pub fn fail_find(&mut self, error: HostError) {
        self.find_failure = Some(error);
    }

    /// Number of times `execute` was called.
    pub fn find_count(&self) -> usize {
        self.find_count
    }

    pub fn last_find_options(&self) -> Option<&FindOptions> {
        self.last_find_options.as_ref()
    }

    fn search_documents(&self, options: &FindOptions) -> Result<(String, FindOutcome), HostError> {
        if let Some(listing) = &self.listing_override {
            return Ok((listing.clone(), FindOutcome::Found));
        }
        let filter = FileFilter::parse(&options.file_filter)?;
        let matcher = LineMatcher::new(options)?;
        let mut writer = ListingWriter::new(options);
        for document in &self.documents {
            let path = Path::new(document.path());
            let in_scope = if options.recursive {
                path.starts_with(&options.root)
            } else {
                path.parent() == Some(options.root.as_path())
            };
            if in_scope && filter.matches(path) {
                writer.push_file(document.path(), document.text(), &matcher);
            }
        }
        let outcome = if writer.matching_lines() > 0 {
            FindOutcome::Found
        } else {
            FindOutcome::NotFound
        };
        Ok((writer.finish(), outcome))
    }
}

impl Workspace for MemoryHost {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.clone()
    }
}

impl SymbolIndex for MemoryHost {
    fn lookup(&mut self, name: &str, whole_word: bool) -> Result<Vec<CandidateId>, HostError> {
        if let Some(error) = &self.index_failure {
            return Err(error.clone());
        }
        self.candidates = self
            .symbols
            .iter()
            .filter(|symbol| {
                if whole_word {
                    symbol.name == name
                } else {
                    symbol.name.contains(name)
                }
            })
            .cloned()
            .collect();
        Ok((0..self.candidates.len()).map(CandidateId).collect())
    }
}

impl Navigator for MemoryHost {
    fn go_to_declaration(&mut self, candidate: CandidateId) -> Result<(), HostError> {
        let symbol = self
            .candidates
            .get(candidate.0)
            .ok_or_else(|| HostError::failed("navigation", format!("unknown candidate {}", candidate.0)))?;
        self.active = self.by_path.get(&symbol.path).copied();
        self.selection = self.active.map(|_| symbol.point);
        Ok(())
    }

    fn active_document(&self) -> Option<ActiveDocument> {
        let id = self.active?;
        Some(ActiveDocument {
            id,
            path: self.documents.get(id.0 as usize)?.path().to_string(),
        })
    }

    fn selection(&self) -> Option<TextPoint> {
        self.selection
    }
}

impl CodeModel for MemoryHost {
    fn element_at(&self, document: DocumentId, point: TextPoint) -> Option<CodeElement> {
        let path = self.documents.get(document.0 as usize)?.path();
        self.elements
            .get(path)?
            .iter()
            .filter(|element| element.start_line <= point.line && point.line <= element.end_line)
            .min_by_key(|element| element.end_line - element.start_line)
            .cloned()
    }
}

impl DocumentProvider for MemoryHost {
    fn open_or_get(&mut self, path: &str) -> Option<DocumentId> {
        self.by_path.get(path).copied()
    }

    fn last_line(&self, document: DocumentId) -> Option<u32> {
        self.documents.get(document.0 as usize).map(TextDocument::last_line)
    }

    fn text_of_lines(&self, document: DocumentId, start: u32, end: u32) -> Option<String> {
        self.documents
            .get(document.0 as usize)?
            .lines(start, end)
            .map(str::to_string)
    }
}

impl FindEngine for MemoryHost {
    fn configure(&mut self, options: FindOptions) {
        self.find_options = Some(options);
    }

    fn execute(&mut self) -> Result<FindStatus, HostError> {
        self.find_count += 1;
        if let Some(error) = &self.find_failure {
            return Err(error.clone());
        }
        let options = self
            .find_options
            .clone()
            .ok_or_else(|| HostError::InvalidOptions("find engine was not configured".to_string()))?;
        let (listing, outcome) = self.search_documents(&options)?;
        self.results = listing;
        self.last_find_options = Some(options.clone());

        self.next_search_id += 1;
        let done = FindDone {
            search_id: SearchId(self.next_search_id),
            outcome,
            cancelled: false,
        };
        debug!("In-memory find {} for '{}'", self.next_search_id, options.query);

        if options.wait_for_completion || !self.deferred_completion {
            self.events.notify(done);
            return Ok(FindStatus::Completed);
        }

        let search_id = done.search_id;
        let events = self.events.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    events.notify(done);
                });
            }
            Err(_) => {
                events.notify(done);
            }
        }
        Ok(FindStatus::Pending(search_id))
    }

    fn find_events(&self) -> FindEvents {
        self.events.clone()
    }

    fn results_listing(&mut self) -> Result<String, HostError> {
        Ok(self.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ElementKind, PatternSyntax};

    fn options(query: &str) -> FindOptions {
        FindOptions {
            query: query.to_string(),
            root: PathBuf::from("/ws"),
            recursive: true,
            match_case: true,
            whole_word: true,
            pattern: PatternSyntax::Literal,
            file_filter: "*.h;*.cpp".to_string(),
            wait_for_completion: true,
        }
    }

    #[test]
    fn test_find_scans_documents_under_root() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.add_document("/ws/src/foo.cpp", "int a;\nvoid bar() {\n}\n");
        host.add_document("/ws/src/foo.rs", "fn bar() {}\n");
        host.add_document("/elsewhere/bar.cpp", "void bar();\n");

        host.configure(options("bar"));
        assert_eq!(host.execute().unwrap(), FindStatus::Completed);

        let listing = host.results_listing().unwrap();
        let rows: Vec<&str> = listing.lines().filter(|l| l.starts_with("  /")).collect();
        assert_eq!(rows, vec!["  /ws/src/foo.cpp(2):void bar() {"]);
        assert_eq!(host.find_count(), 1);
    }

    #[test]
    fn test_element_at_prefers_innermost() {
        let mut host = MemoryHost::new();
        let doc = host.add_document("/ws/a.cpp", "x\n".repeat(30).as_str());
        host.add_element(
            "/ws/a.cpp",
            CodeElement {
                kind: ElementKind::Function,
                full_name: "outer".to_string(),
                start_line: 1,
                end_line: 30,
            },
        );
        host.add_element(
            "/ws/a.cpp",
            CodeElement {
                kind: ElementKind::Function,
                full_name: "inner".to_string(),
                start_line: 10,
                end_line: 12,
            },
        );

        let element = host.element_at(doc, TextPoint::new(11, 1)).unwrap();
        assert_eq!(element.full_name, "inner");
        let element = host.element_at(doc, TextPoint::new(20, 1)).unwrap();
        assert_eq!(element.full_name, "outer");
    }

    #[test]
    fn test_navigation_to_unknown_document_clears_state() {
        let mut host = MemoryHost::new();
        host.declare_symbol("Render", "/ws/missing.cpp", TextPoint::new(3, 1));
        let candidates = host.lookup("Render", true).unwrap();
        host.go_to_declaration(candidates[0]).unwrap();
        assert!(host.active_document().is_none());
        assert!(host.selection().is_none());
    }
}

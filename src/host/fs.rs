//! Filesystem-backed host engine.
//!
//! Documents come from disk, the find engine walks the search root and writes a
//! find-results style listing, and symbol lookups scan declarations on demand
//! with tree-sitter. Nothing is indexed ahead of time.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use lru::LruCache;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, trace, warn};
use walkdir::{DirEntry, WalkDir};

use super::matcher::{FileFilter, LineMatcher, ListingWriter};
use super::syntax::{self, SourceLanguage};
use super::{
    ActiveDocument, CandidateId, CodeElement, CodeModel, DocumentId, DocumentProvider,
    FindDone, FindEngine, FindEvents, FindOptions, FindOutcome, FindStatus, Navigator, SearchId,
    SymbolIndex, TextDocument, TextPoint, Workspace,
};
use crate::error::HostError;

/// Documents kept open when no capacity is configured.
pub const DEFAULT_DOCUMENT_CAPACITY: usize = 256;

struct OpenDocument {
    path: PathBuf,
    document: TextDocument,
    modified: Option<SystemTime>,
}

/// The find engine's results window. Only the most recently issued search may
/// write to it, and only that search's listing can be read back.
#[derive(Debug, Default)]
struct ResultsWindow {
    latest: Option<SearchId>,
    listing: Option<(SearchId, String)>,
}

impl ResultsWindow {
    fn begin(&mut self, search_id: SearchId) {
        self.latest = Some(search_id);
    }

    /// Returns false when `search_id` has been superseded; the listing is dropped.
    fn store(&mut self, search_id: SearchId, listing: String) -> bool {
        if self.latest != Some(search_id) {
            return false;
        }
        self.listing = Some((search_id, listing));
        true
    }

    fn current(&self) -> Option<&str> {
        match (&self.listing, self.latest) {
            (Some((id, text)), Some(latest)) if *id == latest => Some(text),
            _ => None,
        }
    }
}

fn lock_results(results: &Mutex<ResultsWindow>) -> MutexGuard<'_, ResultsWindow> {
    results.lock().unwrap_or_else(PoisonError::into_inner)
}

fn document_capacity(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

/// Runs blocking filesystem work off the async worker on a multi-thread
/// runtime, inline everywhere else.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    path: PathBuf,
    point: TextPoint,
}

/// Host engine over a directory tree.
pub struct FsHost {
    workspace_root: Option<PathBuf>,
    index_filter: FileFilter,
    documents: LruCache<DocumentId, OpenDocument>,
    by_path: HashMap<PathBuf, DocumentId>,
    next_document_id: u32,
    candidates: Vec<Declaration>,
    active: Option<DocumentId>,
    selection: Option<TextPoint>,
    find_options: Option<FindOptions>,
    results: Arc<Mutex<ResultsWindow>>,
    events: FindEvents,
    next_search_id: u64,
}

impl FsHost {
    /// A host with no workspace attached. `index_filter` selects the files
    /// considered by symbol lookups.
    pub fn new(index_filter: FileFilter) -> Self {
        Self {
            workspace_root: None,
            index_filter,
            documents: LruCache::new(document_capacity(DEFAULT_DOCUMENT_CAPACITY)),
            by_path: HashMap::new(),
            next_document_id: 0,
            candidates: Vec::new(),
            active: None,
            selection: None,
            find_options: None,
            results: Arc::new(Mutex::new(ResultsWindow::default())),
            events: FindEvents::new(),
            next_search_id: 1,
        }
    }

    /// A host attached to the workspace at `root`.
    pub fn open(root: &Path, index_filter: FileFilter) -> io::Result<Self> {
        let mut host = Self::new(index_filter);
        host.open_workspace(root)?;
        Ok(host)
    }

    /// Keeps at most `capacity` documents open; the least recently used one is
    /// closed first and its `DocumentId` stops resolving.
    pub fn with_document_capacity(mut self, capacity: usize) -> Self {
        self.documents.resize(document_capacity(capacity));
        let documents = &self.documents;
        self.by_path.retain(|_, id| documents.contains(id));
        self
    }

    pub fn open_document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn open_workspace(&mut self, root: &Path) -> io::Result<()> {
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("workspace root is not a directory: {}", root.display()),
            ));
        }
        self.close_workspace();
        info!("Workspace opened: {}", root.display());
        self.workspace_root = Some(root);
        Ok(())
    }

    pub fn close_workspace(&mut self) {
        if let Some(root) = self.workspace_root.take() {
            info!("Workspace closed: {}", root.display());
        }
        self.documents.clear();
        self.by_path.clear();
        self.candidates.clear();
        self.active = None;
        self.selection = None;
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    /// Opens `path`, reloading it if the file changed since it was last read.
    fn load(&mut self, path: PathBuf) -> Option<DocumentId> {
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
        let cached = self.by_path.get(&path).copied();
        if let Some(id) = cached {
            if self
                .documents
                .get(&id)
                .is_some_and(|open| open.modified == modified)
            {
                return Some(id);
            }
        }
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                debug!("Cannot open document {}: {}", path.display(), e);
                return None;
            }
        };
        let id = match cached {
            Some(id) => id,
            None => {
                let id = DocumentId(self.next_document_id);
                self.next_document_id = self.next_document_id.checked_add(1)?;
                id
            }
        };
        let opened = OpenDocument {
            path: path.clone(),
            document: TextDocument::new(path.to_string_lossy(), text),
            modified,
        };
        if let Some((evicted_id, evicted)) = self.documents.push(id, opened) {
            if evicted_id != id {
                trace!("Closing least recently used document {}", evicted.path.display());
                self.by_path.remove(&evicted.path);
            }
        }
        self.by_path.insert(path, id);
        Some(id)
    }

    fn document(&self, id: DocumentId) -> Option<&TextDocument> {
        self.documents.peek(&id).map(|open| &open.document)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Files under `root` in a stable order, skipping hidden entries.
pub(crate) fn walk_files(root: &Path, recursive: bool) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
}

fn search_files(options: &FindOptions, filter: &FileFilter, matcher: &LineMatcher) -> (String, FindOutcome) {
    let mut writer = ListingWriter::new(options);
    for path in walk_files(&options.root, options.recursive) {
        if !filter.matches(&path) {
            continue;
        }
        // Binary and non-UTF-8 files are not searched
        let Ok(text) = fs::read_to_string(&path) else {
            continue;
        };
        writer.push_file(&path.to_string_lossy(), &text, matcher);
    }
    let outcome = if writer.matching_lines() > 0 {
        FindOutcome::Found
    } else {
        FindOutcome::NotFound
    };
    (writer.finish(), outcome)
}

/// Declarations under `root` whose simple name matches `name`, in file order.
fn scan_declarations(root: &Path, index_filter: &FileFilter, name: &str, whole_word: bool) -> Vec<Declaration> {
    let mut found = Vec::new();
    for path in walk_files(root, true) {
        if !index_filter.matches(&path) {
            continue;
        }
        let Some(language) = SourceLanguage::from_path(&path) else {
            continue;
        };
        let Ok(source) = fs::read_to_string(&path) else {
            continue;
        };
        if !source.contains(name) {
            continue;
        }
        let points = syntax::declarations_matching(&source, language, |declared| {
            if whole_word {
                declared == name
            } else {
                declared.contains(name)
            }
        });
        found.extend(points.into_iter().map(|point| Declaration {
            path: path.clone(),
            point,
        }));
    }
    found
}

impl Workspace for FsHost {
    fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.clone()
    }
}

impl SymbolIndex for FsHost {
    fn lookup(&mut self, name: &str, whole_word: bool) -> Result<Vec<CandidateId>, HostError> {
        let root = self
            .workspace_root
            .clone()
            .ok_or(HostError::Unavailable("object search"))?;
        if name.is_empty() {
            return Err(HostError::InvalidOptions("empty symbol name".to_string()));
        }

        let index_filter = &self.index_filter;
        self.candidates = run_blocking(|| scan_declarations(&root, index_filter, name, whole_word));
        debug!("Object search for '{}' found {} declarations", name, self.candidates.len());
        Ok((0..self.candidates.len()).map(CandidateId).collect())
    }
}

impl Navigator for FsHost {
    fn go_to_declaration(&mut self, candidate: CandidateId) -> Result<(), HostError> {
        let declaration = self
            .candidates
            .get(candidate.0)
            .cloned()
            .ok_or_else(|| HostError::failed("navigation", format!("unknown candidate {}", candidate.0)))?;
        match self.load(declaration.path) {
            Some(id) => {
                self.active = Some(id);
                self.selection = Some(declaration.point);
            }
            None => {
                self.active = None;
                self.selection = None;
            }
        }
        Ok(())
    }

    fn active_document(&self) -> Option<ActiveDocument> {
        let id = self.active?;
        let document = self.document(id)?;
        Some(ActiveDocument {
            id,
            path: document.path().to_string(),
        })
    }

    fn selection(&self) -> Option<TextPoint> {
        self.active.and(self.selection)
    }
}

impl CodeModel for FsHost {
    fn element_at(&self, document: DocumentId, point: TextPoint) -> Option<CodeElement> {
        let document = self.document(document)?;
        let language = SourceLanguage::from_path(Path::new(document.path()))?;
        syntax::enclosing_function(document.text(), language, point)
    }
}

impl DocumentProvider for FsHost {
    fn open_or_get(&mut self, path: &str) -> Option<DocumentId> {
        let resolved = self.resolve(path);
        self.load(resolved)
    }

    fn last_line(&self, document: DocumentId) -> Option<u32> {
        self.document(document).map(TextDocument::last_line)
    }

    fn text_of_lines(&self, document: DocumentId, start: u32, end: u32) -> Option<String> {
        self.document(document)?.lines(start, end).map(str::to_string)
    }
}

impl FindEngine for FsHost {
    fn configure(&mut self, options: FindOptions) {
        self.find_options = Some(options);
    }

    fn execute(&mut self) -> Result<FindStatus, HostError> {
        let options = self
            .find_options
            .clone()
            .ok_or_else(|| HostError::InvalidOptions("find engine was not configured".to_string()))?;
        let filter = FileFilter::parse(&options.file_filter)?;
        let matcher = LineMatcher::new(&options)?;
        if !options.root.is_dir() {
            return Err(HostError::failed(
                "find engine",
                format!("search root does not exist: {}", options.root.display()),
            ));
        }

        let search_id = SearchId(self.next_search_id);
        self.next_search_id += 1;
        debug!("Find {} started under {}", search_id.0, options.root.display());
        lock_results(&self.results).begin(search_id);

        if options.wait_for_completion {
            let (listing, outcome) = run_blocking(|| search_files(&options, &filter, &matcher));
            lock_results(&self.results).store(search_id, listing);
            self.events.notify(FindDone {
                search_id,
                outcome,
                cancelled: false,
            });
            return Ok(FindStatus::Completed);
        }

        let handle = Handle::try_current()
            .map_err(|_| HostError::Unavailable("find engine background worker"))?;
        let results = Arc::clone(&self.results);
        let events = self.events.clone();
        handle.spawn_blocking(move || {
            let (listing, outcome) = search_files(&options, &filter, &matcher);
            if !lock_results(&results).store(search_id, listing) {
                debug!("Find {} was superseded, discarding its listing", search_id.0);
            }
            if events.notify(FindDone {
                search_id,
                outcome,
                cancelled: false,
            }) == 0
            {
                warn!("Find {} completed with no listeners", search_id.0);
            }
        });
        Ok(FindStatus::Pending(search_id))
    }

    fn find_events(&self) -> FindEvents {
        self.events.clone()
    }

    fn results_listing(&mut self) -> Result<String, HostError> {
        lock_results(&self.results)
            .current()
            .map(str::to_string)
            .ok_or_else(|| HostError::failed("find results", "the latest search has not completed"))
    }
}

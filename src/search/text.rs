use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use super::context::{extract, ContextMargins};
use super::listing::parse_listing;
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::host::{
    DocumentProvider, FindEngine, FindOptions, FindOutcome, FindStatus, PatternSyntax, Workspace,
};

/// One matching line with its context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextHit {
    pub file_path: String,
    pub line: u32,
    pub context: String,
}

/// A text search as requested by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextQuery {
    pub text: String,
    /// Directory relative to the workspace root; `.` is the root itself.
    pub search_path: String,
    pub margins: ContextMargins,
    /// `;`-separated file-name globs.
    pub file_filter: String,
}

/// How the orchestrator drives the find engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearchSettings {
    pub wait_for_completion: bool,
    pub find_timeout: Duration,
    /// Stop collecting hits once this much time has passed.
    pub time_limit: Option<Duration>,
}

impl Default for TextSearchSettings {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for TextSearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            wait_for_completion: config.wait_for_completion,
            find_timeout: config.find_timeout(),
            time_limit: config.result_time_limit(),
        }
    }
}

/// Joins a request's search path onto the workspace root.
///
/// The search path must be relative and must stay inside the workspace.
pub fn resolve_search_root(workspace_root: &Path, search_path: &str) -> Result<PathBuf> {
    let search_path = search_path.trim();
    if search_path.is_empty() {
        return Err(SearchError::InvalidRequest("search path is empty".to_string()));
    }
    let normalized = search_path.replace('\\', "/");
    let relative = Path::new(&normalized);

    let mut root = workspace_root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => root.push(part),
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SearchError::InvalidRequest(format!(
                    "search path must be relative to the workspace: {}",
                    search_path
                )));
            }
        }
    }
    Ok(root)
}

/// Runs a text search through the host's find engine and returns the hits in
/// listing order.
///
/// The engine is configured for a recursive, case-sensitive, whole-word,
/// literal search. Documents that cannot be opened are skipped.
pub async fn find_text<H>(host: &mut H, query: &TextQuery, settings: &TextSearchSettings) -> Result<Vec<TextHit>>
where
    H: FindEngine + DocumentProvider + Workspace + ?Sized,
{
    if query.text.is_empty() {
        return Err(SearchError::InvalidRequest("search text is empty".to_string()));
    }
    let workspace_root = host.workspace_root().ok_or(SearchError::NoWorkspace)?;
    let root = resolve_search_root(&workspace_root, &query.search_path)?;

    let options = FindOptions {
        query: query.text.clone(),
        root,
        recursive: true,
        match_case: true,
        whole_word: true,
        pattern: PatternSyntax::Literal,
        file_filter: query.file_filter.clone(),
        wait_for_completion: settings.wait_for_completion,
    };
    debug!(
        "Text search '{}' under {} ({})",
        options.query,
        options.root.display(),
        options.file_filter
    );

    let listing = run_find(host, options, settings.find_timeout).await?;
    let hits = collect_hits(host, &listing, query.margins, settings.time_limit);
    debug!("Text search '{}': {} hits", query.text, hits.len());
    Ok(hits)
}

/// Configures and executes one find, waits for it to complete and returns the
/// results listing.
///
/// The completion subscription is taken before the search is issued and is
/// dropped on every exit path.
pub async fn run_find<F>(engine: &mut F, options: FindOptions, timeout: Duration) -> Result<String>
where
    F: FindEngine + ?Sized,
{
    engine.configure(options);
    let mut subscription = engine.find_events().subscribe();

    match engine.execute()? {
        FindStatus::Completed => {}
        FindStatus::Pending(search_id) => {
            debug!("Waiting for find {} to complete", search_id.0);
            let done = subscription.wait_for(search_id, timeout).await?;
            if done.outcome == FindOutcome::Failed {
                return Err(SearchError::HostUnavailable(format!(
                    "find {} reported failure",
                    search_id.0
                )));
            }
            if done.cancelled {
                warn!("Find {} was cancelled, reading partial results", search_id.0);
            }
        }
    }
    drop(subscription);

    Ok(engine.results_listing()?)
}

fn collect_hits<D>(docs: &mut D, listing: &str, margins: ContextMargins, time_limit: Option<Duration>) -> Vec<TextHit>
where
    D: DocumentProvider + ?Sized,
{
    let started = Instant::now();
    let mut hits = Vec::new();
    for row in parse_listing(listing) {
        if let Some(limit) = time_limit {
            if started.elapsed() >= limit {
                warn!("Result time limit of {:?} reached after {} hits", limit, hits.len());
                break;
            }
        }
        let Some(document) = docs.open_or_get(&row.path) else {
            warn!("Skipping hit in inaccessible document {}", row.path);
            continue;
        };
        let Some(window) = extract(&*docs, document, row.line, margins) else {
            warn!("Skipping hit at {}({}): no context", row.path, row.line);
            continue;
        };
        hits.push(TextHit {
            file_path: row.path,
            line: row.line,
            context: window.text,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::{FindDone, FindEvents, MemoryHost, MockFindEngine, SearchId};
    use test_log::test;

    fn numbered(lines: u32) -> String {
        (1..=lines).map(|n| format!("line {}\n", n)).collect()
    }

    fn query(text: &str, before: u32, after: u32) -> TextQuery {
        TextQuery {
            text: text.to_string(),
            search_path: ".".to_string(),
            margins: ContextMargins::new(before, after),
            file_filter: "*.h;*.cpp".to_string(),
        }
    }

    fn options() -> FindOptions {
        FindOptions {
            query: "bar".to_string(),
            root: PathBuf::from("/ws"),
            recursive: true,
            match_case: true,
            whole_word: true,
            pattern: PatternSyntax::Literal,
            file_filter: "*.cpp".to_string(),
            wait_for_completion: false,
        }
    }

    fn done(id: u64, outcome: FindOutcome) -> FindDone {
        FindDone {
            search_id: SearchId(id),
            outcome,
            cancelled: false,
        }
    }

    #[test(tokio::test)]
    async fn test_listing_hits_with_context() {
        let listing = "2 matches found\nfoo.cpp(10): void bar() {\nfoo.cpp(15): void bar() {\n";
        let mut host = MemoryHost::new().with_workspace("/ws").with_listing(listing);
        host.add_document("foo.cpp", &numbered(20));

        let hits = find_text(&mut host, &query("bar", 2, 1), &TextSearchSettings::default())
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].file_path, "foo.cpp");
        assert_eq!(hits[0].line, 10);
        assert_eq!(hits[0].context, "line 8\nline 9\nline 10\nline 11");
        assert_eq!(hits[1].line, 15);
        assert_eq!(hits[1].context, "line 13\nline 14\nline 15\nline 16");
    }

    #[test(tokio::test)]
    async fn test_find_options_sent_to_engine() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.add_document("/ws/src/gfx/scene.cpp", "void bar() {\n}\n");

        let mut request = query("bar", 0, 0);
        request.search_path = "src/gfx".to_string();
        find_text(&mut host, &request, &TextSearchSettings::default())
            .await
            .unwrap();

        let sent = host.last_find_options().unwrap();
        assert_eq!(sent.root, PathBuf::from("/ws/src/gfx"));
        assert!(sent.recursive && sent.match_case && sent.whole_word);
        assert_eq!(sent.pattern, PatternSyntax::Literal);
        assert_eq!(sent.file_filter, "*.h;*.cpp");
        assert!(sent.wait_for_completion);
    }

    #[test(tokio::test)]
    async fn test_repeated_search_is_stable() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.add_document("/ws/a.cpp", "int bar;\nvoid bar();\nbarrel();\n");
        host.add_document("/ws/b.h", "// bar\n");

        let settings = TextSearchSettings::default();
        let first = find_text(&mut host, &query("bar", 1, 1), &settings).await.unwrap();
        let second = find_text(&mut host, &query("bar", 1, 1), &settings).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert_eq!(host.find_count(), 2);
    }

    #[test(tokio::test)]
    async fn test_deferred_completion_is_awaited() {
        let mut host = MemoryHost::new()
            .with_workspace("/ws")
            .with_deferred_completion(true);
        host.add_document("/ws/a.cpp", "void bar();\n");
        let events = host.find_events();

        let settings = TextSearchSettings {
            wait_for_completion: false,
            ..TextSearchSettings::default()
        };
        let hits = find_text(&mut host, &query("bar", 0, 0), &settings).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].context, "void bar();");
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test(tokio::test)]
    async fn test_inaccessible_documents_are_skipped() {
        let listing = "header\nmissing.cpp(3): bar\nfoo.cpp(1): bar\n";
        let mut host = MemoryHost::new().with_workspace("/ws").with_listing(listing);
        host.add_document("foo.cpp", "bar\n");

        let hits = find_text(&mut host, &query("bar", 5, 5), &TextSearchSettings::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_path, "foo.cpp");
    }

    #[test(tokio::test)]
    async fn test_rows_past_document_end_are_dropped() {
        let listing = "h\nfoo.cpp(100): bar\nfoo.cpp(10): bar\n";
        let mut host = MemoryHost::new().with_workspace("/ws").with_listing(listing);
        host.add_document("foo.cpp", &numbered(10));

        let hits = find_text(&mut host, &query("bar", 2, 1), &TextSearchSettings::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 10);
        assert_eq!(hits[0].context, "line 8\nline 9\nline 10");
    }

    #[test(tokio::test)]
    async fn test_time_limit_stops_collection() {
        let listing = "header\nfoo.cpp(1): bar\nfoo.cpp(2): bar\n";
        let mut host = MemoryHost::new().with_workspace("/ws").with_listing(listing);
        host.add_document("foo.cpp", "bar\nbar\n");

        let settings = TextSearchSettings {
            time_limit: Some(Duration::ZERO),
            ..TextSearchSettings::default()
        };
        let hits = find_text(&mut host, &query("bar", 0, 0), &settings).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test(tokio::test)]
    async fn test_usage_errors() {
        let settings = TextSearchSettings::default();
        let mut host = MemoryHost::new();
        assert!(matches!(
            find_text(&mut host, &query("bar", 0, 0), &settings).await,
            Err(SearchError::NoWorkspace)
        ));

        let mut host = MemoryHost::new().with_workspace("/ws");
        assert!(matches!(
            find_text(&mut host, &query("", 0, 0), &settings).await,
            Err(SearchError::InvalidRequest(_))
        ));
        let mut escaping = query("bar", 0, 0);
        escaping.search_path = "../other".to_string();
        assert!(matches!(
            find_text(&mut host, &escaping, &settings).await,
            Err(SearchError::InvalidRequest(_))
        ));
        assert_eq!(host.find_count(), 0);
    }

    #[test]
    fn test_resolve_search_root() {
        let root = Path::new("/ws");
        assert_eq!(resolve_search_root(root, ".").unwrap(), PathBuf::from("/ws"));
        assert_eq!(resolve_search_root(root, "src\\gfx").unwrap(), PathBuf::from("/ws/src/gfx"));
        assert_eq!(resolve_search_root(root, "./src/").unwrap(), PathBuf::from("/ws/src"));
        assert!(resolve_search_root(root, "").is_err());
        assert!(resolve_search_root(root, "/etc").is_err());
        assert!(resolve_search_root(root, "src/../..").is_err());
    }

    #[test(tokio::test)]
    async fn test_failed_execute_releases_subscription() {
        let events = FindEvents::new();
        let mut engine = MockFindEngine::new();
        engine.expect_configure().times(1).returning(|_| ());
        let shared = events.clone();
        engine.expect_find_events().returning(move || shared.clone());
        engine
            .expect_execute()
            .times(1)
            .returning(|| Err(HostError::Unavailable("find engine")));
        engine.expect_results_listing().never();

        let err = run_find(&mut engine, options(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::HostUnavailable(_)));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test(tokio::test)]
    async fn test_pending_search_waits_for_its_own_event() {
        let events = FindEvents::new();
        let mut engine = MockFindEngine::new();
        engine.expect_configure().returning(|_| ());
        let shared = events.clone();
        engine.expect_find_events().returning(move || shared.clone());
        let publisher = events.clone();
        engine.expect_execute().times(1).returning(move || {
            publisher.notify(done(1, FindOutcome::Failed));
            publisher.notify(done(2, FindOutcome::Found));
            Ok(FindStatus::Pending(SearchId(2)))
        });
        engine
            .expect_results_listing()
            .times(1)
            .returning(|| Ok("header\nfoo.cpp(1): bar\n".to_string()));

        let listing = run_find(&mut engine, options(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(listing.contains("foo.cpp(1)"));
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test(tokio::test)]
    async fn test_cancelled_search_still_reads_partial_listing() {
        let events = FindEvents::new();
        let mut engine = MockFindEngine::new();
        engine.expect_configure().returning(|_| ());
        let shared = events.clone();
        engine.expect_find_events().returning(move || shared.clone());
        let publisher = events.clone();
        engine.expect_execute().times(1).returning(move || {
            publisher.notify(FindDone {
                cancelled: true,
                ..done(3, FindOutcome::Found)
            });
            Ok(FindStatus::Pending(SearchId(3)))
        });
        engine
            .expect_results_listing()
            .times(1)
            .returning(|| Ok("header\nfoo.cpp(4): bar\n".to_string()));

        let listing = run_find(&mut engine, options(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(listing, "header\nfoo.cpp(4): bar\n");
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test(tokio::test)]
    async fn test_failed_or_missing_completion() {
        let events = FindEvents::new();
        let mut engine = MockFindEngine::new();
        engine.expect_configure().returning(|_| ());
        let shared = events.clone();
        engine.expect_find_events().returning(move || shared.clone());
        let publisher = events.clone();
        engine.expect_execute().times(1).returning(move || {
            publisher.notify(done(5, FindOutcome::Failed));
            Ok(FindStatus::Pending(SearchId(5)))
        });
        engine.expect_results_listing().never();
        let err = run_find(&mut engine, options(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::HostUnavailable(_)));

        let mut silent = MockFindEngine::new();
        silent.expect_configure().returning(|_| ());
        let shared = events.clone();
        silent.expect_find_events().returning(move || shared.clone());
        silent
            .expect_execute()
            .returning(|| Ok(FindStatus::Pending(SearchId(9))));
        silent.expect_results_listing().never();
        let err = run_find(&mut silent, options(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::HostUnavailable(_)));
        assert_eq!(events.subscriber_count(), 0);
    }
}

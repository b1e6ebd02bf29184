use std::sync::Arc;
use std::time::Instant;

use codesearch_proto::codesearch::{
    SymbolInfo, SymbolRequest, SymbolResponse, TextSearchRequest, TextSearchResponse,
    TextSearchResult,
};
use codesearch_proto::symbol_search_service_server::SymbolSearchService;
use tonic::{Request, Response, Status};
use tracing::{error, info, warn};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::host::{Host, HostAffinity};
use crate::search::{find_symbols, find_text, ContextMargins, TextQuery, TextSearchSettings};
use crate::server::ServerError;

/// gRPC front end over a host engine.
pub struct CodeSearchServiceImpl<H> {
    host: HostAffinity<H>,
    search: Arc<SearchConfig>,
}

impl<H> std::fmt::Debug for CodeSearchServiceImpl<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeSearchServiceImpl")
            .field("search", &self.search)
            .field("host", &"<HostAffinity>")
            .finish()
    }
}

impl<H: Host> CodeSearchServiceImpl<H> {
    pub fn new(host: HostAffinity<H>, search: SearchConfig) -> Self {
        Self {
            host,
            search: Arc::new(search),
        }
    }
}

fn to_status(operation: &str, err: SearchError) -> Status {
    match &err {
        SearchError::HostUnavailable(_) | SearchError::Io(_) => {
            error!("{} failed: {}", operation, err)
        }
        SearchError::NoWorkspace | SearchError::InvalidRequest(_) => {
            warn!("{} rejected: {}", operation, err)
        }
    }
    ServerError::from(err).into()
}

/// Turns the request's `file_extension` into a glob list. Bare extensions such
/// as `cpp` or `.cpp` become `*.cpp`; entries that already are globs are kept.
fn file_filter_for(file_extension: &str, default: &str) -> String {
    let patterns: Vec<String> = file_extension
        .split([';', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if entry.contains(['*', '?', '[']) {
                entry.to_string()
            } else {
                format!("*.{}", entry.trim_start_matches('.'))
            }
        })
        .collect();
    if patterns.is_empty() {
        default.to_string()
    } else {
        patterns.join(";")
    }
}

fn line_number(line: u32) -> i32 {
    i32::try_from(line).unwrap_or(i32::MAX)
}

#[tonic::async_trait]
impl<H: Host> SymbolSearchService for CodeSearchServiceImpl<H> {
    async fn find_symbols(
        &self,
        request: Request<SymbolRequest>,
    ) -> std::result::Result<Response<SymbolResponse>, Status> {
        let req = request.into_inner();
        let name = req.symbol_name.trim();
        if name.is_empty() {
            return Err(ServerError::InvalidRequest("symbol_name is required".to_string()).into());
        }
        info!("FindSymbols '{}'", name);
        let started = Instant::now();

        let hits = {
            let mut host = self.host.enter().await;
            find_symbols(&mut *host, name, self.search.symbol_context_lines)
        }
        .map_err(|e| to_status("FindSymbols", e))?;

        let symbols: Vec<SymbolInfo> = hits
            .into_iter()
            .map(|hit| SymbolInfo {
                name: hit.name,
                r#type: hit.kind,
                file_path: hit.file_path,
                line_number: line_number(hit.line),
                context: hit.context,
            })
            .collect();
        info!(
            "FindSymbols '{}' returned {} symbols in {:?}",
            name,
            symbols.len(),
            started.elapsed()
        );
        Ok(Response::new(SymbolResponse { symbols }))
    }

    async fn find_text(
        &self,
        request: Request<TextSearchRequest>,
    ) -> std::result::Result<Response<TextSearchResponse>, Status> {
        let req = request.into_inner();
        if req.text.is_empty() {
            return Err(ServerError::InvalidRequest("text is required".to_string()).into());
        }
        if req.search_path.trim().is_empty() {
            return Err(ServerError::InvalidRequest("search_path is required".to_string()).into());
        }

        let query = TextQuery {
            text: req.text,
            search_path: req.search_path,
            margins: ContextMargins::from_request(
                req.context_before,
                req.context_after,
                self.search.default_margins(),
            ),
            file_filter: file_filter_for(&req.file_extension, &self.search.default_file_filter),
        };
        let settings = TextSearchSettings::from(self.search.as_ref());
        info!(
            "FindText '{}' in '{}' ({})",
            query.text, query.search_path, query.file_filter
        );
        let started = Instant::now();

        let hits = {
            let mut host = self.host.enter().await;
            let hits = find_text(&mut *host, &query, &settings).await;
            hits
        }
        .map_err(|e| to_status("FindText", e))?;

        let results: Vec<TextSearchResult> = hits
            .into_iter()
            .map(|hit| TextSearchResult {
                file_path: hit.file_path,
                line_number: line_number(hit.line),
                context: hit.context,
            })
            .collect();
        info!(
            "FindText '{}' returned {} results in {:?}",
            query.text,
            results.len(),
            started.elapsed()
        );
        Ok(Response::new(TextSearchResponse { results }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::{CodeElement, ElementKind, MemoryHost, TextPoint};
    use tonic::Code;

    fn numbered(lines: u32) -> String {
        (1..=lines).map(|n| format!("line {}\n", n)).collect()
    }

    fn service(host: MemoryHost) -> CodeSearchServiceImpl<MemoryHost> {
        CodeSearchServiceImpl::new(HostAffinity::new(host), SearchConfig::default())
    }

    fn text_request(text: &str) -> TextSearchRequest {
        TextSearchRequest {
            text: text.to_string(),
            search_path: ".".to_string(),
            context_before: None,
            context_after: None,
            file_extension: String::new(),
        }
    }

    #[tokio::test]
    async fn test_no_workspace_is_failed_precondition() {
        let service = service(MemoryHost::new());
        let status = service
            .find_text(Request::new(text_request("bar")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::FailedPrecondition);

        let status = service
            .find_symbols(Request::new(SymbolRequest {
                symbol_name: "Render".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn test_missing_fields_are_invalid_argument() {
        let service = service(MemoryHost::new().with_workspace("/ws"));
        let status = service
            .find_symbols(Request::new(SymbolRequest {
                symbol_name: " ".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let status = service
            .find_text(Request::new(text_request("")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);

        let mut request = text_request("bar");
        request.search_path = String::new();
        let status = service.find_text(Request::new(request)).await.unwrap_err();
        assert_eq!(status.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_find_text_defaults_and_clamping() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.add_document("/ws/foo.cpp", &format!("{}void bar() {{\n{}", numbered(9), numbered(10)));
        host.add_document("/ws/foo.py", "bar = 1\n");
        let service = service(host);

        let response = service
            .find_text(Request::new(text_request("bar")))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.results.len(), 1);
        let result = &response.results[0];
        assert_eq!(result.file_path, "/ws/foo.cpp");
        assert_eq!(result.line_number, 10);
        assert_eq!(result.context.lines().count(), 11);

        let mut request = text_request("bar");
        request.context_before = Some(-4);
        request.context_after = Some(1);
        let response = service
            .find_text(Request::new(request))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.results[0].context, "void bar() {\nline 1");
    }

    #[tokio::test]
    async fn test_find_text_file_extension() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.add_document("/ws/foo.cpp", "bar\n");
        host.add_document("/ws/foo.py", "bar\n");
        let service = service(host);

        let mut request = text_request("bar");
        request.file_extension = ".py".to_string();
        let response = service
            .find_text(Request::new(request))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].file_path, "/ws/foo.py");
    }

    #[tokio::test]
    async fn test_find_symbols_response() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.add_document("/ws/scene.cpp", &numbered(20));
        host.add_element(
            "/ws/scene.cpp",
            CodeElement {
                kind: ElementKind::Function,
                full_name: "Scene::Render".to_string(),
                start_line: 12,
                end_line: 14,
            },
        );
        host.declare_symbol("Render", "/ws/scene.cpp", TextPoint::new(12, 12));
        host.declare_symbol("Render", "/ws/gone.cpp", TextPoint::new(1, 1));
        let service = service(host);

        let response = service
            .find_symbols(Request::new(SymbolRequest {
                symbol_name: "Render".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(response.symbols.len(), 1);
        let symbol = &response.symbols[0];
        assert_eq!(symbol.name, "Scene::Render");
        assert_eq!(symbol.r#type, "function");
        assert_eq!(symbol.file_path, "/ws/scene.cpp");
        assert_eq!(symbol.line_number, 12);
        assert_eq!(symbol.context.lines().next(), Some("line 7"));
        assert_eq!(symbol.context.lines().last(), Some("line 19"));
    }

    #[tokio::test]
    async fn test_host_failure_is_unavailable() {
        let mut host = MemoryHost::new().with_workspace("/ws");
        host.fail_find(HostError::failed("find engine", "busy"));
        let service = service(host);

        let status = service
            .find_text(Request::new(text_request("bar")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unavailable);
    }

    #[test]
    fn test_file_filter_for() {
        assert_eq!(file_filter_for("", "*.h;*.cpp"), "*.h;*.cpp");
        assert_eq!(file_filter_for("cpp", "*.h"), "*.cpp");
        assert_eq!(file_filter_for(".h; cc", "*.h"), "*.h;*.cc");
        assert_eq!(file_filter_for("*.inl", "*.h"), "*.inl");
    }
}

use crate::host::{DocumentId, DocumentProvider};

/// Margin used when a request does not specify one.
pub const DEFAULT_CONTEXT_LINES: u32 = 5;

/// Number of lines taken before and after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextMargins {
    pub before: u32,
    pub after: u32,
}

impl Default for ContextMargins {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_LINES, DEFAULT_CONTEXT_LINES)
    }
}

impl ContextMargins {
    pub fn new(before: u32, after: u32) -> Self {
        Self { before, after }
    }

    /// Margins from optional request values: unset falls back to `defaults`,
    /// negative clamps to 0.
    pub fn from_request(before: Option<i32>, after: Option<i32>, defaults: ContextMargins) -> Self {
        let clamp = |value: i32| value.max(0) as u32;
        Self {
            before: before.map(clamp).unwrap_or(defaults.before),
            after: after.map(clamp).unwrap_or(defaults.after),
        }
    }
}

/// Inclusive line range around `target`, clamped to `1..=last_line`.
///
/// `None` when `target` itself is not a line of the document.
pub fn window_bounds(target: u32, margins: ContextMargins, last_line: u32) -> Option<(u32, u32)> {
    if target == 0 || target > last_line {
        return None;
    }
    let start = target.saturating_sub(margins.before).max(1);
    let end = target.saturating_add(margins.after).min(last_line);
    Some((start, end))
}

/// Source lines surrounding a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub start_line: u32,
    pub end_line: u32,
    pub text: String,
}

/// Reads the context window around `target` from an open document.
pub fn extract<D>(docs: &D, document: DocumentId, target: u32, margins: ContextMargins) -> Option<ContextWindow>
where
    D: DocumentProvider + ?Sized,
{
    let last_line = docs.last_line(document)?;
    let (start_line, end_line) = window_bounds(target, margins, last_line)?;
    let text = docs.text_of_lines(document, start_line, end_line)?;
    Some(ContextWindow {
        start_line,
        end_line,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    fn numbered(lines: u32) -> String {
        (1..=lines).map(|n| format!("line {}\n", n)).collect()
    }

    #[test]
    fn test_short_document_window() {
        let mut host = MemoryHost::new();
        let doc = host.add_document("/ws/short.cpp", &numbered(3));

        let window = extract(&host, doc, 1, ContextMargins::new(5, 5)).unwrap();
        assert_eq!((window.start_line, window.end_line), (1, 3));
        assert_eq!(window.text, "line 1\nline 2\nline 3");
    }

    #[test]
    fn test_window_in_the_middle() {
        let mut host = MemoryHost::new();
        let doc = host.add_document("/ws/long.cpp", &numbered(20));

        let window = extract(&host, doc, 10, ContextMargins::new(2, 1)).unwrap();
        assert_eq!((window.start_line, window.end_line), (8, 11));
        assert_eq!(window.text, "line 8\nline 9\nline 10\nline 11");
    }

    #[test]
    fn test_bounds_stay_inside_document() {
        for last_line in 1..=12u32 {
            for target in 1..=last_line {
                for before in 0..=6u32 {
                    for after in [0, 1, 3, 7, u32::MAX] {
                        let (start, end) =
                            window_bounds(target, ContextMargins::new(before, after), last_line)
                                .unwrap();
                        assert!(1 <= start && start <= target && target <= end && end <= last_line);
                    }
                }
            }
        }
    }

    #[test]
    fn test_target_outside_document_has_no_window() {
        let margins = ContextMargins::new(2, 1);
        assert_eq!(window_bounds(0, margins, 10), None);
        assert_eq!(window_bounds(11, margins, 10), None);
        assert_eq!(window_bounds(100, margins, 10), None);

        let mut host = MemoryHost::new();
        let doc = host.add_document("/ws/ten.cpp", &numbered(10));
        assert!(extract(&host, doc, 100, margins).is_none());
        assert_eq!(extract(&host, doc, 10, margins).unwrap().text, "line 8\nline 9\nline 10");
    }

    #[test]
    fn test_margins_from_request() {
        let defaults = ContextMargins::default();
        assert_eq!(ContextMargins::from_request(None, None, defaults), ContextMargins::new(5, 5));
        assert_eq!(ContextMargins::from_request(Some(-3), Some(2), defaults), ContextMargins::new(0, 2));
        assert_eq!(ContextMargins::from_request(Some(0), None, defaults), ContextMargins::new(0, 5));
    }

    #[test]
    fn test_unknown_document_has_no_window() {
        let host = MemoryHost::new();
        assert!(extract(&host, DocumentId(3), 1, ContextMargins::default()).is_none());
    }
}

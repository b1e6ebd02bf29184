/// Text of one document with a line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    path: String,
    text: String,
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(i, _)| i + 1)
                .filter(|&start| start < text.len()),
        );
        Self {
            path: path.into(),
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of the last line. An empty document still has line 1.
    pub fn last_line(&self) -> u32 {
        u32::try_from(self.line_starts.len()).unwrap_or(u32::MAX)
    }

    /// Lines `start..=end`, without the final line terminator.
    pub fn lines(&self, start: u32, end: u32) -> Option<&str> {
        if start == 0 || start > end || end > self.last_line() {
            return None;
        }
        let begin = self.line_starts[start as usize - 1];
        let finish = self
            .line_starts
            .get(end as usize)
            .copied()
            .unwrap_or(self.text.len());
        let slice = &self.text[begin..finish];
        let slice = match slice.strip_suffix('\n') {
            Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
            None => slice,
        };
        Some(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_count_ignores_trailing_newline() {
        assert_eq!(TextDocument::new("a", "one\ntwo\n").last_line(), 2);
        assert_eq!(TextDocument::new("a", "one\ntwo").last_line(), 2);
        assert_eq!(TextDocument::new("a", "").last_line(), 1);
    }

    #[test]
    fn test_lines_inclusive_range() {
        let doc = TextDocument::new("a.cpp", "l1\r\nl2\r\nl3\r\nl4\r\n");
        assert_eq!(doc.lines(2, 3), Some("l2\r\nl3"));
        assert_eq!(doc.lines(4, 4), Some("l4"));
        assert_eq!(doc.lines(1, 4), Some("l1\r\nl2\r\nl3\r\nl4"));
    }

    #[test]
    fn test_lines_rejects_out_of_range() {
        let doc = TextDocument::new("a.cpp", "l1\nl2");
        assert_eq!(doc.lines(0, 1), None);
        assert_eq!(doc.lines(2, 1), None);
        assert_eq!(doc.lines(1, 3), None);
    }
}

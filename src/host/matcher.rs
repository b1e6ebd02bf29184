//! Line matching and results-listing output shared by the reference hosts.

use std::fmt::Write as _;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};

use super::{FindOptions, PatternSyntax};
use crate::error::HostError;

/// A `;`-separated list of file-name globs, e.g. `*.h;*.cpp`.
#[derive(Debug, Clone)]
pub struct FileFilter {
    spec: String,
    set: GlobSet,
}

impl FileFilter {
    /// Parses a glob list. An empty list matches every file.
    pub fn parse(spec: &str) -> Result<Self, HostError> {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = 0;
        for pattern in spec.split([';', ',']).map(str::trim).filter(|p| !p.is_empty()) {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| HostError::InvalidOptions(format!("file filter '{}': {}", pattern, e)))?;
            builder.add(glob);
            patterns += 1;
        }
        if patterns == 0 {
            builder.add(
                GlobBuilder::new("*")
                    .build()
                    .map_err(|e| HostError::InvalidOptions(e.to_string()))?,
            );
        }
        let set = builder
            .build()
            .map_err(|e| HostError::InvalidOptions(format!("file filter '{}': {}", spec, e)))?;
        Ok(Self {
            spec: spec.to_string(),
            set,
        })
    }

    /// Matches on the file name only.
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name().is_some_and(|name| self.set.is_match(name))
    }

    pub fn as_str(&self) -> &str {
        &self.spec
    }
}

/// Decides whether a single line matches the configured query.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    regex: Regex,
    whole_word: bool,
}

impl LineMatcher {
    pub fn new(options: &FindOptions) -> Result<Self, HostError> {
        if options.query.is_empty() {
            return Err(HostError::InvalidOptions("empty find query".to_string()));
        }
        let pattern = match options.pattern {
            PatternSyntax::Literal => regex::escape(&options.query),
            PatternSyntax::Regex => options.query.clone(),
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.match_case)
            .build()
            .map_err(|e| HostError::InvalidOptions(e.to_string()))?;
        Ok(Self {
            regex,
            whole_word: options.whole_word,
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        if !self.whole_word {
            return self.regex.is_match(line);
        }
        self.regex
            .find_iter(line)
            .any(|m| !m.as_str().is_empty() && is_whole_word(line, m.start(), m.end()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_whole_word(line: &str, start: usize, end: usize) -> bool {
    let before = line[..start].chars().next_back();
    let after = line[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Builds a results listing in the find-results window layout:
/// a `Find all` header, one `  <path>(<line>):<text>` row per matching line
/// and a summary row.
pub struct ListingWriter {
    out: String,
    matching_lines: usize,
    matching_files: usize,
    files_searched: usize,
}

impl ListingWriter {
    pub fn new(options: &FindOptions) -> Self {
        let mut header = format!("Find all \"{}\"", options.query);
        if options.match_case {
            header.push_str(", Match case");
        }
        if options.whole_word {
            header.push_str(", Whole word");
        }
        if options.pattern == PatternSyntax::Regex {
            header.push_str(", Regular expressions");
        }
        if options.recursive {
            header.push_str(", Subfolders");
        }
        let _ = write!(
            header,
            ", Find Results 1, \"{}\", \"{}\"",
            options.root.display(),
            options.file_filter
        );
        header.push('\n');
        Self {
            out: header,
            matching_lines: 0,
            matching_files: 0,
            files_searched: 0,
        }
    }

    /// Appends every matching line of one file.
    pub fn push_file(&mut self, path: &str, text: &str, matcher: &LineMatcher) {
        self.files_searched += 1;
        let before = self.matching_lines;
        for (index, line) in text.lines().enumerate() {
            if matcher.is_match(line) {
                let _ = writeln!(self.out, "  {}({}):{}", path, index + 1, line);
                self.matching_lines += 1;
            }
        }
        if self.matching_lines > before {
            self.matching_files += 1;
        }
    }

    pub fn matching_lines(&self) -> usize {
        self.matching_lines
    }

    pub fn finish(mut self) -> String {
        let _ = writeln!(
            self.out,
            "  Matching lines: {}    Matching files: {}    Total files searched: {}",
            self.matching_lines, self.matching_files, self.files_searched
        );
        self.out
    }
}

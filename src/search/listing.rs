//! Parser for the find engine's results listing.
//!
//! The listing is a line-oriented dump: a header line, then one row per match
//! shaped like `<path>(<line>): <text>` or `<path>(<line>,<column>): <text>`,
//! usually followed by a summary row. Paths may carry a drive letter or a UNC
//! prefix and either separator style. Rows that do not fit are skipped, never
//! reported as errors.

use std::iter::Skip;
use std::str::Lines;

/// One match row of a results listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine<'a> {
    /// Path as written in the listing, with `\` normalized to `/`.
    pub path: String,
    /// 1-based line number of the match.
    pub line: u32,
    /// Everything after the location's colon, as written.
    pub match_text: &'a str,
}

impl ListingLine<'_> {
    /// Last path segment.
    pub fn file_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(slash) => &self.path[slash + 1..],
            None => &self.path,
        }
    }
}

/// Lazily parses `listing`. The first line is always treated as a header.
pub fn parse_listing(listing: &str) -> ListingLines<'_> {
    ListingLines {
        lines: listing.lines().skip(1),
    }
}

/// Iterator returned by [`parse_listing`].
#[derive(Debug, Clone)]
pub struct ListingLines<'a> {
    lines: Skip<Lines<'a>>,
}

impl<'a> Iterator for ListingLines<'a> {
    type Item = ListingLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.by_ref().find_map(parse_line)
    }
}

/// Parses a single listing row; `None` if it is not a match row.
pub fn parse_line(raw: &str) -> Option<ListingLine<'_>> {
    // The location ends at the first colon right after a closing parenthesis,
    // so drive letters and colons inside the matched text are left alone.
    let colon = raw
        .match_indices(':')
        .map(|(index, _)| index)
        .find(|&index| raw[..index].trim_end().ends_with(')'))?;

    let location = raw[..colon].trim();
    let open = location.rfind('(')?;
    let close = location.rfind(')')?;
    if close < open {
        return None;
    }

    let path = location[..open].trim_end().replace('\\', "/");
    if path.is_empty() {
        return None;
    }

    let numbers = &location[open + 1..close];
    let line_text = numbers.split(',').next().unwrap_or(numbers).trim();
    let line = line_text.parse::<u32>().ok().filter(|&line| line > 0)?;

    Some(ListingLine {
        path,
        line,
        match_text: &raw[colon + 1..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_match_listing() {
        let listing = "2 matches found\nfoo.cpp(10): void bar() {\nfoo.cpp(15): void bar() {\n";
        let hits: Vec<ListingLine<'_>> = parse_listing(listing).collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, "foo.cpp");
        assert_eq!(hits[0].file_name(), "foo.cpp");
        assert_eq!(hits[0].line, 10);
        assert_eq!(hits[0].match_text, " void bar() {");
        assert_eq!(hits[1].line, 15);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let listing = "header\nweirdline no colon here\nfoo.cpp(3): ok\nbar.cpp(x): bad line\n(4): no path\n";
        let hits: Vec<ListingLine<'_>> = parse_listing(listing).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "foo.cpp");
        assert_eq!(hits[0].line, 3);
    }

    #[test]
    fn test_first_line_is_never_a_hit() {
        let listing = "foo.cpp(1): looks like a hit\nfoo.cpp(2): real hit";
        let hits: Vec<ListingLine<'_>> = parse_listing(listing).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 2);
    }

    #[test]
    fn test_windows_paths() {
        let drive = parse_line(r"  C:\src\render\Scene.cpp(42): Scene::Render() {").unwrap();
        assert_eq!(drive.path, "C:/src/render/Scene.cpp");
        assert_eq!(drive.file_name(), "Scene.cpp");
        assert_eq!(drive.line, 42);

        let unc = parse_line(r"\\build01\share\gfx\Scene.h(7):void Render();").unwrap();
        assert_eq!(unc.path, "//build01/share/gfx/Scene.h");
        assert_eq!(unc.line, 7);
        assert_eq!(unc.match_text, "void Render();");

        let parens = parse_line(r"C:\Program Files (x86)\sdk\api.h(12): int f();").unwrap();
        assert_eq!(parens.path, "C:/Program Files (x86)/sdk/api.h");
        assert_eq!(parens.line, 12);
    }

    #[test]
    fn test_column_and_colons_in_text() {
        let hit = parse_line("src/a.cpp(9,14): std::string name = \"a:b\";").unwrap();
        assert_eq!(hit.line, 9);
        assert_eq!(hit.match_text, " std::string name = \"a:b\";");
    }

    #[test]
    fn test_summary_and_zero_lines_are_skipped() {
        assert!(parse_line("  Matching lines: 2    Matching files: 1    Total files searched: 9").is_none());
        assert!(parse_line("foo.cpp(0): zero").is_none());
        assert!(parse_line("foo.cpp)10(: reversed").is_none());
    }

    #[test]
    fn test_emitted_count_is_bounded_by_rows() {
        let inputs = [
            "",
            "only header",
            "h\na(1):x\nb(2):y\n\n\nc(3):z",
            "h\n::::\n()():\n(((:)))\n",
            "h\r\nfoo.cpp(3): crlf\r\n",
        ];
        for input in inputs {
            let rows = input.lines().count();
            let hits = parse_listing(input).count();
            assert!(hits <= rows.saturating_sub(1), "input {:?}", input);
        }
    }

    #[test]
    fn test_parsing_is_restartable() {
        let listing = "h\na.cpp(1): x\nb.cpp(2): y\n";
        let first: Vec<ListingLine<'_>> = parse_listing(listing).collect();
        let second: Vec<ListingLine<'_>> = parse_listing(listing).collect();
        assert_eq!(first, second);
    }
}

//! Line-oriented source text and section spans
//!
//! [`SourceText`] keeps a file as lines while remembering its newline
//! style and whether it ended with a newline, so a whole-file rewrite
//! changes only the lines that were edited.

use docnav_model::DocumentFormat;

use crate::parser::is_block_metadata;
use crate::scanner::{scan_headings, span_end, HeadingLine};

/// A file split into lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
}

impl SourceText {
    /// Split text into lines, accepting `\n` and `\r\n`
    pub fn parse(text: &str) -> Self {
        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = text.ends_with('\n');

        let mut lines: Vec<String> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        if trailing_newline || text.is_empty() {
            lines.pop();
        }

        Self {
            lines,
            newline,
            trailing_newline,
        }
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if there are no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines, without line terminators
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// A 1-based line
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }

    /// Lines `start..=end` (1-based, clamped) joined with `\n`
    pub fn slice(&self, start: usize, end: usize) -> String {
        let from = start.saturating_sub(1).min(self.lines.len());
        let to = end.min(self.lines.len()).max(from);
        self.lines[from..to].join("\n")
    }

    /// Every heading in the text
    pub fn headings(&self, format: DocumentFormat) -> Vec<HeadingLine> {
        scan_headings(self.lines.iter().map(String::as_str), format)
    }

    /// First line of the block anchors and attribute lines stacked directly
    /// on top of line `heading`; `heading` itself when there are none
    pub fn metadata_start(&self, format: DocumentFormat, heading: usize) -> usize {
        let mut first = heading;
        while first > 1
            && self
                .line(first - 1)
                .is_some_and(|l| is_block_metadata(format, l))
        {
            first -= 1;
        }
        first
    }

    /// Replace lines `start..=end` (1-based) with `replacement`
    pub fn splice(&mut self, start: usize, end: usize, replacement: Vec<String>) {
        let from = start.saturating_sub(1).min(self.lines.len());
        let to = end.min(self.lines.len()).max(from);
        self.lines.splice(from..to, replacement);
    }

    /// Insert lines so that the first one becomes line `at + 1`
    pub fn insert(&mut self, at: usize, lines: Vec<String>) {
        let at = at.min(self.lines.len());
        self.lines.splice(at..at, lines);
    }

    /// Reassemble the file with its original newline style
    pub fn render(&self) -> String {
        let mut out = self.lines.join(self.newline);
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(self.newline);
        }
        out
    }
}

/// Lines occupied by one section in its file (1-based, inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    /// Heading line
    pub start: usize,
    /// Last line before the first child heading (or `end`)
    pub body_end: usize,
    /// Last line of the section including its subsections
    pub end: usize,
    /// Heading level as written in the file
    pub level: u8,
}

impl SectionSpan {
    /// Locate the section whose heading is on line `start`.
    ///
    /// Anchor and attribute lines above the next heading belong to that
    /// heading, so both ends stop short of them.
    ///
    /// Returns `None` when that line is not a heading, which means the
    /// file changed since it was indexed.
    pub fn locate(text: &SourceText, format: DocumentFormat, start: usize) -> Option<Self> {
        let headings = text.headings(format);
        let heading = headings.iter().find(|h| h.line == start)?;
        let before = |next: usize| text.metadata_start(format, next).max(start + 1) - 1;

        let mut end = span_end(&headings, start, text.len())?;
        if headings.iter().any(|h| h.line == end + 1) {
            end = before(end + 1);
        }

        let body_end = headings
            .iter()
            .find(|h| h.line > start && h.line <= end && h.level > heading.level)
            .map(|h| before(h.line))
            .unwrap_or(end);

        Some(Self {
            start,
            body_end,
            end,
            level: heading.level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render_round_trip() {
        for text in ["a\nb\n", "a\nb", "a\r\nb\r\n", "", "\n", "a\n\n"] {
            assert_eq!(SourceText::parse(text).render(), text, "{:?}", text);
        }
    }

    #[test]
    fn test_crlf_lines_are_clean() {
        let text = SourceText::parse("= A\r\n\r\nBody\r\n");
        assert_eq!(text.lines(), ["= A", "", "Body"]);
        assert_eq!(text.line(3), Some("Body"));
        assert_eq!(text.line(0), None);
        assert_eq!(text.line(4), None);
    }

    #[test]
    fn test_slice_and_splice() {
        let mut text = SourceText::parse("1\n2\n3\n4\n");
        assert_eq!(text.slice(2, 3), "2\n3");
        assert_eq!(text.slice(3, 99), "3\n4");

        text.splice(2, 3, vec!["x".into()]);
        assert_eq!(text.render(), "1\nx\n4\n");

        text.insert(3, vec!["end".into()]);
        assert_eq!(text.render(), "1\nx\n4\nend\n");
    }

    #[test]
    fn test_locate_span() {
        let text = SourceText::parse("= Doc\n\n== A\nbody\n=== A1\nchild\n== B\nlast\n");
        let a = SectionSpan::locate(&text, DocumentFormat::AsciiDoc, 3).unwrap();
        assert_eq!((a.start, a.body_end, a.end, a.level), (3, 4, 6, 1));

        let b = SectionSpan::locate(&text, DocumentFormat::AsciiDoc, 7).unwrap();
        assert_eq!((b.body_end, b.end), (8, 8));

        assert!(SectionSpan::locate(&text, DocumentFormat::AsciiDoc, 4).is_none());
    }

    #[test]
    fn test_span_leaves_next_anchor_alone() {
        let text = SourceText::parse(
            "= Doc\n\n== A\nbody\n\n[[a1]]\n=== A1\nchild\n\n[#b]\n[appendix]\n== B\n",
        );
        assert_eq!(text.metadata_start(DocumentFormat::AsciiDoc, 12), 10);
        assert_eq!(text.metadata_start(DocumentFormat::AsciiDoc, 3), 3);

        let a = SectionSpan::locate(&text, DocumentFormat::AsciiDoc, 3).unwrap();
        assert_eq!((a.body_end, a.end), (5, 9));
        let a1 = SectionSpan::locate(&text, DocumentFormat::AsciiDoc, 7).unwrap();
        assert_eq!(a1.end, 9);

        // Markdown has no block metadata lines
        let md = SourceText::parse("# Doc\n\n## A\n[x]\n## B\n");
        assert_eq!(md.metadata_start(DocumentFormat::Markdown, 5), 5);
        let a = SectionSpan::locate(&md, DocumentFormat::Markdown, 3).unwrap();
        assert_eq!(a.end, 4);
    }
}

//! Line classification for AsciiDoc and Markdown
//!
//! The scanner decides, line by line, whether a line is a heading, opens
//! or closes a delimited block, or is plain text. Delimited blocks are
//! opaque: a `== Heading` inside a listing block, a fenced code block or an
//! HTML comment is body text, not a section. Only the delimiter that
//! opened a block closes it.
//!
//! The parsers, the search body extraction and the editor's span location
//! all use the same scanner, so they always agree on where sections start.

use std::sync::OnceLock;

use docnav_model::DocumentFormat;
use regex::Regex;

/// Kind of delimited block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `----` listing/source block
    Listing,
    /// `....` literal block
    Literal,
    /// `////` comment block
    Comment,
    /// `++++` passthrough block
    Passthrough,
    /// `====` example block (also used for admonition blocks)
    Example,
    /// `****` sidebar
    Sidebar,
    /// `____` quote block
    Quote,
    /// `|===` table
    Table,
    /// `--` open block
    Open,
    /// Markdown ``` or ~~~ fence
    Fence,
    /// `<!-- ... -->` spanning several lines
    HtmlComment,
}

/// Classification of a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Section heading; `level` is the marker count minus one
    Heading { level: u8, title: String },
    /// Opening delimiter; `info` is the fence info string for Markdown
    BlockOpen { kind: BlockKind, info: String },
    /// Closing delimiter
    BlockClose { kind: BlockKind },
    /// A line inside a delimited block
    BlockBody,
    /// Anything else
    Text,
}

#[derive(Debug, Clone)]
struct OpenBlock {
    kind: BlockKind,
    delimiter: String,
}

/// Stateful line classifier
#[derive(Debug, Clone)]
pub struct LineScanner {
    format: DocumentFormat,
    open: Option<OpenBlock>,
}

fn asciidoc_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(={1,6})[ \t]+(\S.*?)(?:[ \t]+=+)?[ \t]*$").unwrap())
}

fn asciidoc_delimiter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(-{4,}|\.{4,}|/{4,}|\+{4,}|={4,}|\*{4,}|_{4,}|\|={3,}|--)$").unwrap()
    })
}

fn markdown_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").unwrap())
}

fn markdown_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})(.*)$").unwrap())
}

impl LineScanner {
    /// Create a scanner at the start of a file
    pub fn new(format: DocumentFormat) -> Self {
        Self { format, open: None }
    }

    /// Whether a delimited block is currently open
    pub fn in_block(&self) -> bool {
        self.open.is_some()
    }

    /// Kind of the currently open block
    pub fn open_block(&self) -> Option<BlockKind> {
        self.open.as_ref().map(|b| b.kind)
    }

    /// Classify the next line
    pub fn scan(&mut self, line: &str) -> LineKind {
        match self.format {
            DocumentFormat::AsciiDoc => self.scan_asciidoc(line),
            DocumentFormat::Markdown => self.scan_markdown(line),
        }
    }

    fn scan_asciidoc(&mut self, line: &str) -> LineKind {
        let trimmed = line.trim_end();

        if let Some(open) = &self.open {
            if trimmed == open.delimiter {
                let kind = open.kind;
                self.open = None;
                return LineKind::BlockClose { kind };
            }
            return LineKind::BlockBody;
        }

        if asciidoc_delimiter_re().is_match(trimmed) {
            let kind = match trimmed.as_bytes()[0] {
                b'-' if trimmed.len() == 2 => BlockKind::Open,
                b'-' => BlockKind::Listing,
                b'.' => BlockKind::Literal,
                b'/' => BlockKind::Comment,
                b'+' => BlockKind::Passthrough,
                b'=' => BlockKind::Example,
                b'*' => BlockKind::Sidebar,
                b'_' => BlockKind::Quote,
                _ => BlockKind::Table,
            };
            self.open = Some(OpenBlock {
                kind,
                delimiter: trimmed.to_string(),
            });
            return LineKind::BlockOpen {
                kind,
                info: String::new(),
            };
        }

        if let Some(caps) = asciidoc_heading_re().captures(trimmed) {
            let level = (caps[1].len() - 1) as u8;
            return LineKind::Heading {
                level,
                title: caps[2].trim().to_string(),
            };
        }

        LineKind::Text
    }

    fn scan_markdown(&mut self, line: &str) -> LineKind {
        if let Some(open) = &self.open {
            let kind = open.kind;
            let closes = match kind {
                BlockKind::HtmlComment => line.contains("-->"),
                _ => is_fence_close(line, &open.delimiter),
            };
            if closes {
                self.open = None;
                return LineKind::BlockClose { kind };
            }
            return LineKind::BlockBody;
        }

        if let Some(caps) = markdown_fence_re().captures(line) {
            let fence = caps[1].to_string();
            let info = caps[2].trim().to_string();
            // Backtick fences may not carry backticks in the info string
            if !(fence.starts_with('`') && info.contains('`')) {
                self.open = Some(OpenBlock {
                    kind: BlockKind::Fence,
                    delimiter: fence,
                });
                return LineKind::BlockOpen {
                    kind: BlockKind::Fence,
                    info,
                };
            }
        }

        if let Some(start) = line.find("<!--") {
            if !line[start + 4..].contains("-->") {
                self.open = Some(OpenBlock {
                    kind: BlockKind::HtmlComment,
                    delimiter: "-->".to_string(),
                });
                return LineKind::BlockOpen {
                    kind: BlockKind::HtmlComment,
                    info: String::new(),
                };
            }
            return LineKind::Text;
        }

        if let Some(caps) = markdown_heading_re().captures(line) {
            let title = caps[2].trim();
            if !title.is_empty() {
                return LineKind::Heading {
                    level: (caps[1].len() - 1) as u8,
                    title: title.to_string(),
                };
            }
        }

        LineKind::Text
    }
}

fn is_fence_close(line: &str, opening: &str) -> bool {
    let trimmed = line.trim();
    let Some(fence_char) = opening.chars().next() else {
        return false;
    };
    let indent = line.len() - line.trim_start().len();
    indent <= 3
        && trimmed.len() >= opening.len()
        && trimmed.chars().all(|c| c == fence_char)
}

/// A heading found in a file: 1-based line and raw level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingLine {
    /// 1-based line number
    pub line: usize,
    /// Level as written in the file (before any `leveloffset`)
    pub level: u8,
    /// Heading text
    pub title: String,
}

/// Every heading in a file, skipping delimited blocks
pub fn scan_headings<'a, I>(lines: I, format: DocumentFormat) -> Vec<HeadingLine>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scanner = LineScanner::new(format);
    lines
        .into_iter()
        .enumerate()
        .filter_map(|(idx, line)| match scanner.scan(line) {
            LineKind::Heading { level, title } => Some(HeadingLine {
                line: idx + 1,
                level,
                title,
            }),
            _ => None,
        })
        .collect()
}

/// Last line of the section whose heading is at `start`.
///
/// The span runs up to the line before the next heading of the same or a
/// higher rank in the same file, or to `total` lines. Returns `None` when
/// no heading starts at `start`.
pub fn span_end(headings: &[HeadingLine], start: usize, total: usize) -> Option<usize> {
    let pos = headings.iter().position(|h| h.line == start)?;
    let level = headings[pos].level;
    let end = headings[pos + 1..]
        .iter()
        .find(|h| h.level <= level)
        .map(|h| h.line - 1)
        .unwrap_or(total);
    Some(end.max(start))
}

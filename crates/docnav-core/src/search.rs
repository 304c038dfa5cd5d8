//! Full-text search over section titles and bodies
//!
//! Matching is a literal substring test. A section's body is its own text
//! only: the lines after its heading up to its first child heading, so a
//! hit deep in a subsection is reported once, on the subsection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{NavError, Result};
use crate::index::{IndexedSection, StructureIndex};
use crate::store::FileStore;
use crate::text::{SectionSpan, SourceText};

/// Default width of a result snippet, in characters
pub const DEFAULT_SNIPPET_WIDTH: usize = 160;

const TITLE_WEIGHT: f64 = 10.0;

/// Search parameters
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Only search sections whose path starts with this
    pub scope: Option<String>,
    pub case_sensitive: bool,
    /// Cap on returned results; `None` is unlimited
    pub max_results: Option<usize>,
    pub snippet_width: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            scope: None,
            case_sensitive: false,
            max_results: Some(50),
            snippet_width: DEFAULT_SNIPPET_WIDTH,
        }
    }
}

/// Where a hit was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Content,
}

/// One matching section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub title: String,
    pub file: String,
    /// Line of the first match (the heading line for title matches)
    pub line: usize,
    pub matched_in: MatchField,
    /// Text around the first match
    pub context: String,
    pub score: f64,
}

/// Search response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchHit>,
    /// Number of matching sections before `max_results` was applied
    pub total_results: usize,
}

/// Run a search against the index, reading section bodies through `store`
pub fn search(
    index: &StructureIndex,
    store: &dyn FileStore,
    query: &str,
    options: &SearchOptions,
) -> Result<SearchResults> {
    if query.trim().is_empty() {
        return Err(NavError::invalid("query", "query must not be empty"));
    }

    let needle = fold(query, options.case_sensitive);
    let mut files = FileCache::new(store);
    let mut hits = Vec::new();

    for section in index.sections() {
        if let Some(scope) = &options.scope {
            if !section.path.starts_with(scope.as_str()) {
                continue;
            }
        }

        let title_hit = fold(&section.title, options.case_sensitive).contains(&needle);
        let body = files.body(section)?;
        let body_hits: Vec<&(usize, String)> = body
            .iter()
            .filter(|(_, line)| fold(line, options.case_sensitive).contains(&needle))
            .collect();

        if !title_hit && body_hits.is_empty() {
            continue;
        }

        let occurrences: usize = body_hits
            .iter()
            .map(|(_, line)| fold(line, options.case_sensitive).matches(&needle).count())
            .sum();
        let score = if title_hit { TITLE_WEIGHT } else { 0.0 } + occurrences as f64;

        let (line, matched_in, context) = match (title_hit, body_hits.first()) {
            (false, Some((line, text))) => (
                *line,
                MatchField::Content,
                snippet(text, query, options.case_sensitive, options.snippet_width),
            ),
            _ => (
                section.source_location.line,
                MatchField::Title,
                snippet(&section.title, query, options.case_sensitive, options.snippet_width),
            ),
        };

        hits.push(SearchHit {
            path: section.path.clone(),
            title: section.title.clone(),
            file: index.display_path(&section.source_location.file),
            line,
            matched_in,
            context,
            score,
        });
    }

    // Stable: equal scores keep document order
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    let total_results = hits.len();
    if let Some(max) = options.max_results {
        hits.truncate(max);
    }

    debug!(query, total_results, returned = hits.len(), "Search finished");
    Ok(SearchResults {
        query: query.to_string(),
        results: hits,
        total_results,
    })
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

/// Up to `width` characters of `line` around the first match
fn snippet(line: &str, query: &str, case_sensitive: bool, width: usize) -> String {
    let line = line.trim();
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= width {
        return line.to_string();
    }

    // Locate the match in char positions
    let haystack: Vec<char> = fold(line, case_sensitive).chars().collect();
    let needle: Vec<char> = fold(query, case_sensitive).chars().collect();
    let found = if haystack.len() == chars.len() {
        haystack
            .windows(needle.len().max(1))
            .position(|w| w == needle.as_slice())
            .unwrap_or(0)
    } else {
        0
    };

    let start = found
        .saturating_sub(width.saturating_sub(needle.len()) / 2)
        .min(chars.len() - width);
    let mut out: String = chars[start..start + width].iter().collect();
    if start > 0 {
        out.insert_str(0, "...");
    }
    if start + width < chars.len() {
        out.push_str("...");
    }
    out
}

/// Reads each source file at most once per search
struct FileCache<'a> {
    store: &'a dyn FileStore,
    files: HashMap<PathBuf, SourceText>,
}

impl<'a> FileCache<'a> {
    fn new(store: &'a dyn FileStore) -> Self {
        Self {
            store,
            files: HashMap::new(),
        }
    }

    fn text(&mut self, file: &Path) -> Result<&SourceText> {
        if !self.files.contains_key(file) {
            let text = self
                .store
                .read_file(file)
                .map_err(|source| NavError::io(file, source))?;
            self.files.insert(file.to_path_buf(), SourceText::parse(&text));
        }
        Ok(&self.files[file])
    }

    /// The section's own body lines with their 1-based line numbers
    fn body(&mut self, section: &IndexedSection) -> Result<Vec<(usize, String)>> {
        let location = &section.source_location;
        let text = self.text(&location.file)?;
        let Some(span) = SectionSpan::locate(text, section.format, location.line) else {
            return Ok(Vec::new());
        };
        Ok((span.start + 1..=span.body_end)
            .filter_map(|n| text.line(n).map(|l| (n, l.to_string())))
            .collect())
    }
}

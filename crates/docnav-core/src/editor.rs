//! Section editing
//!
//! Edits are whole-file rewrites of exactly one source file. Before
//! anything is written the indexed heading must still be where the index
//! says it is, and (for updates) the section's current content hash must
//! match the caller's, if one was supplied.
//!
//! Inserted text is separated from its neighbours by exactly one blank
//! line, so repeated edits do not pile up or glue together paragraphs.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{NavError, Result};
use crate::index::{IndexedSection, StructureIndex};
use crate::parser::heading_title;
use crate::store::FileStore;
use crate::text::{SectionSpan, SourceText};

/// Compute the content hash used for optimistic locking
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    format!("sha256:{:x}", result)
}

/// Where [`ContentEditor::insert_content`] puts new text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    /// Directly before the section's heading
    Before,
    /// After the section and all of its subsections
    After,
    /// At the end of the section's own body, before its first subsection
    Append,
}

impl InsertPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertPosition::Before => "before",
            InsertPosition::After => "after",
            InsertPosition::Append => "append",
        }
    }
}

impl FromStr for InsertPosition {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "before" => Ok(InsertPosition::Before),
            "after" => Ok(InsertPosition::After),
            "append" => Ok(InsertPosition::Append),
            other => Err(NavError::InvalidPosition {
                value: other.to_string(),
            }),
        }
    }
}

/// A section's current text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionContent {
    /// Heading line through the last line of the last subsection
    pub content: String,
    pub content_hash: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Result of a successful edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub success: bool,
    pub path: String,
    /// The one file that was rewritten
    pub file: String,
    /// Hash of the section before the edit
    pub previous_hash: String,
    /// Hash of the section after the edit, usable as the next
    /// `expected_hash`
    pub new_hash: String,
    /// First and last line of the written text in the new file
    pub start_line: usize,
    pub end_line: usize,
}

/// Reads and edits sections through a [`FileStore`]
pub struct ContentEditor<'a> {
    index: &'a StructureIndex,
    store: &'a dyn FileStore,
}

struct Located<'s> {
    section: &'s IndexedSection,
    file: PathBuf,
    text: SourceText,
    span: SectionSpan,
}

impl<'a> ContentEditor<'a> {
    pub fn new(index: &'a StructureIndex, store: &'a dyn FileStore) -> Self {
        Self { index, store }
    }

    fn locate(&self, path: &str) -> Result<Located<'a>> {
        let section = self.index.get_section(path)?;
        let file = section.source_location.file.clone();
        let raw = self
            .store
            .read_file(&file)
            .map_err(|source| NavError::io(&file, source))?;
        let text = SourceText::parse(&raw);

        let stale = || NavError::StaleSection {
            path: path.to_string(),
            file: self.index.display_path(&file),
            line: section.source_location.line,
        };
        let span = SectionSpan::locate(&text, section.format, section.source_location.line)
            .ok_or_else(stale)?;

        // The heading on that line must still be this section's
        let heading = text
            .headings(section.format)
            .into_iter()
            .find(|h| h.line == span.start)
            .ok_or_else(stale)?;
        if heading_title(section.format, &heading.title) != section.title {
            return Err(stale());
        }

        Ok(Located {
            section,
            file,
            text,
            span,
        })
    }

    /// Current text and hash of a section
    pub fn read_section(&self, path: &str) -> Result<SectionContent> {
        let located = self.locate(path)?;
        let content = located.text.slice(located.span.start, located.span.end);
        Ok(SectionContent {
            content_hash: content_hash(&content),
            content,
            start_line: located.span.start,
            end_line: located.span.end,
        })
    }

    /// Replace a section.
    ///
    /// With `preserve_title` the heading line is kept and `content` becomes
    /// the body; otherwise `content` replaces heading and body alike. Empty
    /// content without `preserve_title` removes the section.
    pub fn update_section(
        &self,
        path: &str,
        content: &str,
        preserve_title: bool,
        expected_hash: Option<&str>,
    ) -> Result<EditOutcome> {
        let Located {
            section,
            file,
            mut text,
            span,
        } = self.locate(path)?;

        let current = text.slice(span.start, span.end);
        let previous_hash = content_hash(&current);
        if let Some(expected) = expected_hash {
            if expected != previous_hash {
                return Err(NavError::Conflict {
                    path: path.to_string(),
                    expected: expected.to_string(),
                    actual: previous_hash,
                });
            }
        }

        let body = content_lines(content);
        let mut replacement = Vec::with_capacity(body.len() + 2);
        if preserve_title {
            if let Some(heading) = text.line(span.start) {
                replacement.push(heading.to_string());
            }
            if !body.is_empty() {
                replacement.push(String::new());
            }
        }
        replacement.extend(body);

        let written = replacement.len();
        let followed = span.end < text.len();
        if followed && written > 0 {
            replacement.push(String::new());
        }

        text.splice(span.start, span.end, replacement);
        let end_line = span.start + written.saturating_sub(1);
        // Hash what a fresh read of the section would return
        let new_hash = match SectionSpan::locate(&text, section.format, span.start) {
            Some(s) => content_hash(&text.slice(s.start, s.end)),
            None => content_hash(&text.slice(span.start, end_line)),
        };
        self.write(&file, &text)?;

        info!(path, file = %file.display(), lines = written, "Updated section");
        Ok(EditOutcome {
            success: true,
            path: section.path.clone(),
            file: self.index.display_path(&file),
            previous_hash,
            new_hash,
            start_line: span.start,
            end_line,
        })
    }

    /// Insert text relative to a section
    pub fn insert_content(
        &self,
        path: &str,
        position: InsertPosition,
        content: &str,
    ) -> Result<EditOutcome> {
        let Located {
            section,
            file,
            mut text,
            span,
        } = self.locate(path)?;
        let previous_hash = content_hash(&text.slice(span.start, span.end));

        // Number of lines that stay in front of the insertion point
        let at = match position {
            // Above any anchor or attributes that belong to the heading
            InsertPosition::Before => text.metadata_start(section.format, span.start) - 1,
            InsertPosition::After => span.end,
            InsertPosition::Append => span.body_end,
        };

        let mut lines = content_lines(content);
        let mut start_line = at + 1;
        let mut end_line = at;
        let mut inserted = 0;
        if !lines.is_empty() {
            let count = lines.len();
            if at > 0 && text.line(at).is_some_and(|l| !l.trim().is_empty()) {
                lines.insert(0, String::new());
                start_line += 1;
            }
            if text.line(at + 1).is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            end_line = start_line + count - 1;
            inserted = lines.len();
            text.insert(at, lines);
        }

        // Inserting before the heading pushes it down
        let heading = match position {
            InsertPosition::Before => span.start + inserted,
            _ => span.start,
        };
        let new_hash = match SectionSpan::locate(&text, section.format, heading) {
            Some(s) => content_hash(&text.slice(s.start, s.end)),
            None => previous_hash.clone(),
        };
        self.write(&file, &text)?;

        info!(
            path,
            position = position.as_str(),
            file = %file.display(),
            "Inserted content"
        );
        Ok(EditOutcome {
            success: true,
            path: section.path.clone(),
            file: self.index.display_path(&file),
            previous_hash,
            new_hash,
            start_line,
            end_line,
        })
    }

    fn write(&self, file: &Path, text: &SourceText) -> Result<()> {
        debug!(file = %file.display(), lines = text.len(), "Writing file");
        self.store
            .write_file(file, &text.render())
            .map_err(|source| NavError::io(file, source))
    }
}

/// Split new content into lines, dropping leading and trailing blank lines
fn content_lines(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last]
            .iter()
            .map(|l| l.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

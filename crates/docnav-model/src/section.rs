//! Section and source location definitions
//!
//! A section is one heading-delimited unit of a document. Sections form a
//! tree per document: the document title (level 0) owns the top-level
//! headings, which own their subsections.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a section or element was found in its source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file containing the item
    pub file: PathBuf,
    /// 1-based line number of the first line
    pub line: usize,
    /// 1-based line number of the last line (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    /// The include directive that pulled this location into another document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_from: Option<Box<SourceLocation>>,
}

impl SourceLocation {
    /// Create a location at a 1-based line
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            end_line: None,
            resolved_from: None,
        }
    }

    /// Set the last line of the span
    pub fn with_end_line(mut self, end_line: usize) -> Self {
        self.end_line = Some(end_line);
        self
    }

    /// Link this location back to the include directive that produced it
    pub fn with_resolved_from(mut self, directive: SourceLocation) -> Self {
        self.resolved_from = Some(Box::new(directive));
        self
    }

    /// Whether this location was reached through an include directive
    pub fn is_included(&self) -> bool {
        self.resolved_from.is_some()
    }

    /// The file this location is in
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// A heading-delimited section of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text without markup
    pub title: String,
    /// Heading level (0 = document title, 1..=6 = headings)
    pub level: u8,
    /// Addressable path, e.g. `guide:install.linux`
    pub path: String,
    /// Location of the heading line
    pub source_location: SourceLocation,
    /// Directly nested subsections, in document order
    #[serde(default)]
    pub children: Vec<Section>,
    /// Explicit anchor id, if the heading carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl Section {
    /// Create a section without children
    pub fn new(
        title: impl Into<String>,
        level: u8,
        path: impl Into<String>,
        source_location: SourceLocation,
    ) -> Self {
        Self {
            title: title.into(),
            level,
            path: path.into(),
            source_location,
            children: Vec::new(),
            anchor: None,
        }
    }

    /// Set the anchor id
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Add a child section
    pub fn push(&mut self, child: Section) {
        self.children.push(child);
    }

    /// Depth-first pre-order iteration over this section and its descendants
    pub fn iter(&self) -> SectionIter<'_> {
        SectionIter { stack: vec![self] }
    }

    /// Number of sections in this subtree, including this one
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// Depth-first pre-order iterator over a section tree
pub struct SectionIter<'a> {
    stack: Vec<&'a Section>,
}

impl<'a> SectionIter<'a> {
    /// Iterate over a forest of sections in document order
    pub fn forest(sections: &'a [Section]) -> Self {
        Self {
            stack: sections.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for SectionIter<'a> {
    type Item = &'a Section;

    fn next(&mut self) -> Option<Self::Item> {
        let section = self.stack.pop()?;
        self.stack.extend(section.children.iter().rev());
        Some(section)
    }
}

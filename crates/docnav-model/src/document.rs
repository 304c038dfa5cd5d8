//! Parsed document definitions
//!
//! One `Document` is produced per source file. AsciiDoc documents also
//! carry their attributes, cross references and include directives; for
//! Markdown those collections stay empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::section::{Section, SectionIter, SourceLocation};

/// Source format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// AsciiDoc (`.adoc`, `.asciidoc`)
    AsciiDoc,
    /// Markdown (`.md`)
    Markdown,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "adoc" | "asciidoc" => Some(DocumentFormat::AsciiDoc),
            "md" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }

    /// Lowercase name used in responses
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::AsciiDoc => "asciidoc",
            DocumentFormat::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One include directive found while parsing
///
/// Whether the target exists is not recorded here; it is checked against
/// the filesystem at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeInfo {
    /// Where the `include::` directive was found
    pub source_location: SourceLocation,
    /// Target path, resolved against the including file's directory
    pub target_path: PathBuf,
    /// Directive options (`leveloffset`, `lines`, `tag`, ...)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl IncludeInfo {
    /// Create an include record without options
    pub fn new(source_location: SourceLocation, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_location,
            target_path: target_path.into(),
            options: BTreeMap::new(),
        }
    }

    /// Add a directive option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A cross reference (`<<id>>`, `xref:target[]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Referenced anchor or `file#anchor` target
    pub target: String,
    /// Optional link text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Where the reference was found
    pub source_location: SourceLocation,
}

/// A parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Path of the source file
    pub file_path: PathBuf,
    /// Document title (empty when the file has none)
    pub title: String,
    /// Source format
    pub format: DocumentFormat,
    /// Top-level sections in document order
    pub sections: Vec<Section>,
    /// Non-section elements
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Document attributes (`:name: value`)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Cross references found in the text
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
    /// Include directives, including nested ones reached through expansion
    #[serde(default)]
    pub includes: Vec<IncludeInfo>,
}

impl Document {
    /// Create an empty document for a file
    pub fn new(file_path: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            file_path: file_path.into(),
            title: String::new(),
            format,
            sections: Vec::new(),
            elements: Vec::new(),
            attributes: BTreeMap::new(),
            cross_references: Vec::new(),
            includes: Vec::new(),
        }
    }

    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add a top-level section
    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// All sections, depth-first in document order
    pub fn all_sections(&self) -> SectionIter<'_> {
        SectionIter::forest(&self.sections)
    }

    /// Check if the document has no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("guide.adoc")),
            Some(DocumentFormat::AsciiDoc)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("GUIDE.ASCIIDOC")),
            Some(DocumentFormat::AsciiDoc)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes_v1.2.md")),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_format_serializes_lowercase() {
        let json = serde_json::to_string(&DocumentFormat::AsciiDoc).unwrap();
        assert_eq!(json, "\"asciidoc\"");
    }

    #[test]
    fn test_all_sections_walks_every_tree() {
        let mut doc = Document::new("a.adoc", DocumentFormat::AsciiDoc).with_title("A");
        let mut root = Section::new("A", 0, "a", SourceLocation::new("a.adoc", 1));
        root.push(Section::new("One", 1, "a:one", SourceLocation::new("a.adoc", 3)));
        doc.push(root);

        assert_eq!(doc.all_sections().count(), 2);
        assert!(!doc.is_empty());
    }
}

//! Structure parsers
//!
//! Each parser turns one source file into a [`Document`]: its section tree
//! with addressable paths, its structural elements and (for AsciiDoc) its
//! attributes, cross references and include directives. Parsers never fail
//! on malformed markup; anything unrecognised is body text.

mod asciidoc;
mod markdown;
mod tree;

use std::path::{Path, PathBuf};

use docnav_model::{file_prefix, Document, DocumentFormat, PathStyle};

use crate::error::{NavError, Result};
use crate::store::FileStore;

pub use asciidoc::AsciidocParser;
pub use markdown::MarkdownParser;

/// Default cap on nested include expansion
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 20;

/// Settings shared by all parsers
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Docs root that file prefixes are relative to
    pub root: Option<PathBuf>,
    /// Separators for section paths
    pub path_style: PathStyle,
    /// Include chains deeper than this are not expanded
    pub max_include_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            root: None,
            path_style: PathStyle::default(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl ParserConfig {
    /// Config with a docs root
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Path prefix for a file
    pub fn prefix_for(&self, file: &Path) -> String {
        file_prefix(file, self.root.as_deref())
    }
}

/// A parser for one source format
pub trait StructureParser {
    /// Format this parser handles
    fn format(&self) -> DocumentFormat;

    /// Parse the text of `file`
    fn parse_str(&self, file: &Path, text: &str) -> Document;
}

/// Whether `line` is block metadata that binds to the heading or block
/// right after it
pub fn is_block_metadata(format: DocumentFormat, line: &str) -> bool {
    match format {
        DocumentFormat::AsciiDoc => asciidoc::is_block_metadata(line),
        DocumentFormat::Markdown => false,
    }
}

/// Heading text as it is indexed, without an inline anchor
pub fn heading_title(format: DocumentFormat, raw: &str) -> String {
    match format {
        DocumentFormat::AsciiDoc => asciidoc::split_inline_anchor(raw).0,
        DocumentFormat::Markdown => markdown::split_heading_anchor(raw).0,
    }
}

/// Read and parse a file with the parser matching its extension
pub fn parse_file(path: &Path, config: &ParserConfig, store: &dyn FileStore) -> Result<Document> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        NavError::invalid(
            "file",
            format!("unsupported document format: {}", path.display()),
        )
    })?;
    let text = store
        .read_file(path)
        .map_err(|source| NavError::io(path, source))?;

    let document = match format {
        DocumentFormat::AsciiDoc => AsciidocParser::new(config, store).parse_str(path, &text),
        DocumentFormat::Markdown => MarkdownParser::new(config).parse_str(path, &text),
    };
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_parse_file_dispatches_on_extension() {
        let store = MemoryStore::new();
        store.insert("/docs/a.adoc", "= A\n\n== One\n");
        store.insert("/docs/b.md", "# B\n\n## Two\n");
        store.insert("/docs/c.txt", "text");
        let config = ParserConfig::with_root("/docs");

        let a = parse_file(Path::new("/docs/a.adoc"), &config, &store).unwrap();
        assert_eq!(a.format, DocumentFormat::AsciiDoc);
        assert_eq!(a.sections[0].children[0].path, "a:one");

        let b = parse_file(Path::new("/docs/b.md"), &config, &store).unwrap();
        assert_eq!(b.format, DocumentFormat::Markdown);
        assert_eq!(b.sections[0].children[0].path, "b:two");

        let err = parse_file(Path::new("/docs/c.txt"), &config, &store).unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");

        let err = parse_file(Path::new("/docs/missing.md"), &config, &store).unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }
}

//! docnav-core - Structure index for documentation trees
//!
//! Parses AsciiDoc and Markdown files into addressable section trees,
//! indexes them for lookup and search, and edits sections in place.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use docnav_core::parser::{MarkdownParser, ParserConfig, StructureParser};
//! use docnav_core::StructureIndex;
//!
//! let config = ParserConfig::with_root("/docs");
//! let doc = MarkdownParser::new(&config)
//!     .parse_str(Path::new("/docs/guide.md"), "# Guide\n\n## Install\n");
//!
//! let mut index = StructureIndex::with_root("/docs");
//! index.build_from_documents(vec![doc]);
//!
//! assert_eq!(index.get_section("guide:install").unwrap().title, "Install");
//! ```

pub mod diagnostics;
pub mod editor;
pub mod error;
pub mod include;
pub mod index;
pub mod loader;
pub mod parser;
pub mod scanner;
pub mod search;
pub mod store;
pub mod text;

// Re-export main types and functions
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use editor::{content_hash, ContentEditor, EditOutcome, InsertPosition, SectionContent};
pub use error::{ErrorDetail, NavError, Result};
pub use index::{
    Dependencies, IndexedDocument, IndexedSection, LocationView, SectionNode, SectionSummary,
    StructureIndex, StructureView,
};
pub use loader::{discover_files, load_documents, load_index, LoadOptions};
pub use search::{search, SearchHit, SearchOptions, SearchResults};
pub use store::{FileStore, FsStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! docnav-model - Section model for structured documentation
//!
//! This crate provides the types shared by the docnav parsers, the
//! structure index and the validation service: sections with their
//! source locations, parsed documents, include directives and
//! non-section elements, plus the slug and path rules that turn titles
//! into addressable section paths.

pub mod document;
pub mod element;
pub mod section;
pub mod slug;

pub use document::{CrossReference, Document, DocumentFormat, IncludeInfo};
pub use element::{Element, ElementType};
pub use section::{Section, SectionIter, SourceLocation};
pub use slug::{file_prefix, slugify, strip_doc_extension, PathStyle, KNOWN_DOC_EXTENSIONS};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

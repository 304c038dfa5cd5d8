//! docnav CLI - Command-line interface library
//!
//! Navigate, search and edit a tree of AsciiDoc and Markdown files by
//! section path:
//! - Structure: print the section tree or one section with its hash
//! - Search: literal search over titles and section bodies
//! - Edit: replace a section or insert content next to it
//! - Validate: report duplicate paths and broken or circular includes
//!
//! # Library Usage
//!
//! ```ignore
//! use docnav_cli::{DocsService, Settings};
//!
//! let service = DocsService::open(Path::new("docs"), Settings::default())?;
//! let section = service.get_section("guide:install")?;
//! service.update_section("guide:install", "New text.\n", true, Some(&section.content_hash))?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Section tree, two levels deep
//! docnav --docs-root docs structure --max-depth 2
//!
//! # Read a section as text
//! docnav section guide:install --format text
//!
//! # Replace a section body, guarded by its hash
//! docnav update guide:install --preserve-title --expected-hash <hash> --content-file new.adoc
//! ```

pub mod app;
pub mod config;
pub mod output;
pub mod service;

// Re-export main entry point and types
pub use app::{run, run_cli, Cli, Commands};
pub use config::{load_settings, Settings};
pub use output::OutputFormat;
pub use service::DocsService;

//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docnav_core::NavError;
use tracing_subscriber::EnvFilter;

use crate::config::load_settings;
use crate::output::{self, OutputFormat, Reply};
use crate::service::DocsService;

#[derive(Debug, Parser)]
#[command(name = "docnav")]
#[command(
    author,
    version,
    about = "Navigate, search and edit AsciiDoc/Markdown documentation by section path",
    long_about = None
)]
pub struct Cli {
    /// Documentation root (default: workspace.root from config, then ".")
    #[arg(long, global = true)]
    pub docs_root: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the section tree
    Structure {
        /// Deepest level to show; 0 shows documents only
        #[arg(long, allow_negative_numbers = true)]
        max_depth: Option<i64>,
    },

    /// Show one section with its content and hash
    Section {
        /// Section path, e.g. guide:install.linux
        path: String,
    },

    /// List sections at a heading level
    Sections {
        /// Heading level (1 = top-level headings)
        #[arg(long, allow_negative_numbers = true)]
        level: i64,
    },

    /// Search section titles and bodies
    Search {
        /// Literal text to look for
        query: String,

        /// Only search below this path prefix
        #[arg(long)]
        scope: Option<String>,

        #[arg(long)]
        case_sensitive: bool,

        /// Cap on returned results
        #[arg(long, allow_negative_numbers = true)]
        max_results: Option<i64>,
    },

    /// List code blocks, tables, images, diagrams, admonitions and lists
    Elements {
        /// Element type filter
        #[arg(long = "type")]
        element_type: Option<String>,

        /// Only elements below this section path
        #[arg(long)]
        section: Option<String>,

        /// Include element content
        #[arg(long)]
        include_content: bool,

        /// Truncate content to this many characters
        #[arg(long, allow_negative_numbers = true)]
        content_limit: Option<i64>,
    },

    /// Show project or section metadata
    Metadata {
        /// Section path; omit for the whole tree
        path: Option<String>,
    },

    /// Show include relationships between files
    Dependencies,

    /// Check for duplicate paths and broken or circular includes
    Validate,

    /// Replace a section's content
    Update {
        path: String,

        #[command(flatten)]
        input: ContentInput,

        /// Keep the heading line and replace only the body
        #[arg(long)]
        preserve_title: bool,

        /// Fail unless the section still has this hash
        #[arg(long)]
        expected_hash: Option<String>,
    },

    /// Insert content before, after or inside a section
    Insert {
        path: String,

        /// before, after or append
        #[arg(long)]
        position: String,

        #[command(flatten)]
        input: ContentInput,
    },
}

/// Where edit content comes from; stdin when neither is given
#[derive(Debug, clap::Args)]
pub struct ContentInput {
    /// Content text
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read content from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

impl ContentInput {
    fn read(&self) -> Result<String> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        if let Some(path) = &self.content_file {
            return fs::read_to_string(path)
                .with_context(|| format!("Failed to read content file: {}", path.display()));
        }
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read content from stdin")?;
        Ok(content)
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli).map(ExitCode::from)
}

/// Run an already parsed command line and return the exit status
pub fn run(cli: Cli) -> Result<u8> {
    let cwd = PathBuf::from(".");
    let mut search_dirs: Vec<&Path> = vec![cwd.as_path()];
    if let Some(root) = &cli.docs_root {
        search_dirs.push(root);
    }
    let settings = load_settings(cli.config.as_deref(), &search_dirs)?;

    let root = cli
        .docs_root
        .clone()
        .or_else(|| settings.workspace.root.clone())
        .unwrap_or(cwd);
    let service = match DocsService::open(&root, settings) {
        Ok(service) => service,
        Err(err @ NavError::Io { .. }) => {
            return Err(err).with_context(|| format!("Failed to open docs root {}", root.display()))
        }
        Err(err) => return finish_with_error(err, cli.format),
    };

    match dispatch(&service, cli.command) {
        Ok(Outcome { reply, success }) => {
            reply.print(cli.format)?;
            Ok(if success { 0 } else { 1 })
        }
        Err(DispatchError::Nav(err)) => finish_with_error(err, cli.format),
        Err(DispatchError::Fault(err)) => Err(err),
    }
}

struct Outcome {
    reply: Reply,
    /// False when the command ran but found problems (validation errors)
    success: bool,
}

impl Outcome {
    fn ok(reply: Reply) -> Self {
        Self {
            reply,
            success: true,
        }
    }
}

enum DispatchError {
    Nav(NavError),
    Fault(anyhow::Error),
}

impl From<NavError> for DispatchError {
    fn from(err: NavError) -> Self {
        DispatchError::Nav(err)
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::Fault(err)
    }
}

fn dispatch(service: &DocsService, command: Commands) -> Result<Outcome, DispatchError> {
    let outcome = match command {
        Commands::Structure { max_depth } => {
            let view = service.get_structure(max_depth)?;
            Outcome::ok(Reply::new(&view, output::structure_text))
        }
        Commands::Section { path } => {
            let section = service.get_section(&path)?;
            Outcome::ok(Reply::new(&section, output::section_text))
        }
        Commands::Sections { level } => {
            let response = service.get_sections_at_level(level)?;
            Outcome::ok(Reply::new(&response, output::level_text))
        }
        Commands::Search {
            query,
            scope,
            case_sensitive,
            max_results,
        } => {
            let results = service.search(&query, scope.as_deref(), case_sensitive, max_results)?;
            Outcome::ok(Reply::new(&results, output::search_text))
        }
        Commands::Elements {
            element_type,
            section,
            include_content,
            content_limit,
        } => {
            let response = service.get_elements(
                element_type.as_deref(),
                section.as_deref(),
                include_content,
                content_limit,
            )?;
            Outcome::ok(Reply::new(&response, output::elements_text))
        }
        Commands::Metadata { path } => {
            let metadata = service.get_metadata(path.as_deref())?;
            Outcome::ok(Reply::new(&metadata, output::metadata_text))
        }
        Commands::Dependencies => {
            let deps = service.get_dependencies();
            Outcome::ok(Reply::new(&deps, output::dependencies_text))
        }
        Commands::Validate => {
            let report = service.validate();
            Outcome {
                success: report.valid,
                reply: Reply::new(&report, output::validation_text),
            }
        }
        Commands::Update {
            path,
            input,
            preserve_title,
            expected_hash,
        } => {
            let content = input.read()?;
            let outcome = service.update_section(
                &path,
                &content,
                preserve_title,
                expected_hash.as_deref(),
            )?;
            Outcome::ok(Reply::new(&outcome, output::edit_text))
        }
        Commands::Insert {
            path,
            position,
            input,
        } => {
            let content = input.read()?;
            let outcome = service.insert_content(&path, &position, &content)?;
            Outcome::ok(Reply::new(&outcome, output::edit_text))
        }
    };
    Ok(outcome)
}

/// Print a domain error and pick the exit status: 2 for malformed
/// requests, 1 for everything else. I/O failures are faults.
fn finish_with_error(err: NavError, format: OutputFormat) -> Result<u8> {
    if matches!(err, NavError::Io { .. }) {
        return Err(err.into());
    }
    output::print_error(&err, format)?;
    Ok(if err.is_caller_error() { 2 } else { 1 })
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

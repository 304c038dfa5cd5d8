//! Structural findings
//!
//! Index builds and validation report problems as [`Diagnostic`]s rather
//! than failing: a duplicate section path or a missing include target is
//! something to show the user, not a reason to refuse to answer.

use serde::{Deserialize, Serialize};

/// A finding about the document structure
///
/// # Example
///
/// ```
/// use docnav_core::diagnostics::{Diagnostic, DiagnosticKind};
///
/// let diag = Diagnostic::error(
///     DiagnosticKind::UnresolvedInclude,
///     "Unresolved include: 'missing.adoc' not found",
/// )
/// .with_file("main.adoc")
/// .with_line(12)
/// .with_help("Create the file or fix the include path");
///
/// assert!(diag.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// What kind of problem this is
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,

    /// Human-readable description
    pub message: String,

    /// Section path the finding is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Source file the finding is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// 1-based line in `file`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// How to fix it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Extra context such as the include chain that reached the file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Ordered: `Info < Warning < Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Suspicious structure that still indexes fine
    Warning,

    /// Broken structure that should be fixed
    Error,
}

/// Kind of structural finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Two sections resolve to the same path
    DuplicatePath,
    /// An include directive points at a file that does not exist
    UnresolvedInclude,
    /// Files include each other in a loop
    CircularInclude,
    /// An include chain is deeper than the configured limit
    IncludeDepthExceeded,
    /// A file is both included and indexed on its own
    OrphanedInclude,
}

impl DiagnosticKind {
    /// Snake-case name used in responses
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicatePath => "duplicate_path",
            DiagnosticKind::UnresolvedInclude => "unresolved_include",
            DiagnosticKind::CircularInclude => "circular_include",
            DiagnosticKind::IncludeDepthExceeded => "include_depth_exceeded",
            DiagnosticKind::OrphanedInclude => "orphaned_include",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Diagnostic {
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            path: None,
            file: None,
            line: None,
            help: None,
            notes: Vec::new(),
        }
    }

    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, message)
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, kind, message)
    }

    /// Set the section path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the file, relative to the docs root
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the line number
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders as `error[unresolved_include]: message` followed by an
/// `-->` location line and `=` lines for section, help and notes
impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.kind, self.message)?;

        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "\n  --> {}:{}", file, line)?,
            (Some(file), None) => write!(f, "\n  --> {}", file)?,
            _ => {}
        }
        let extras = self
            .path
            .iter()
            .map(|p| ("section", p))
            .chain(self.help.iter().map(|h| ("help", h)))
            .chain(self.notes.iter().map(|n| ("note", n)));
        for (label, text) in extras {
            write!(f, "\n  = {}: {}", label, text)?;
        }
        Ok(())
    }
}

/// Findings gathered from several validators, in the order they ran
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest severity present, if any
    pub fn worst(&self) -> Option<Severity> {
        self.0.iter().map(|d| d.severity).max()
    }

    /// Split into (errors, everything else), keeping order within each
    pub fn partition(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        self.0.into_iter().partition(Diagnostic::is_error)
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

//! docnav-validate - Structural validation for documentation trees
//!
//! This crate checks a built [`StructureIndex`] and the files behind it for
//! structural defects: duplicate section paths, include directives that
//! point nowhere, include cycles and over-deep include chains.
//!
//! # Architecture
//!
//! Individual checks implement the [`Validator`] trait. The
//! [`ValidationEngine`] runs every registered validator against a
//! [`ValidationContext`] and collects their diagnostics.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use docnav_core::{MemoryStore, StructureIndex};
//! use docnav_validate::{ValidationContext, ValidationEngine};
//!
//! let index = StructureIndex::with_root("/docs");
//! let store = MemoryStore::new();
//! let ctx = ValidationContext::new(&index, Path::new("/docs"), &store);
//!
//! let report = ValidationEngine::with_defaults().report(&ctx);
//! assert!(report.valid);
//! ```

pub mod duplicates;
pub mod graph;
pub mod includes;

use std::path::Path;
use std::time::Instant;

use docnav_core::diagnostics::{Diagnostic, Diagnostics};
use docnav_core::parser::DEFAULT_MAX_INCLUDE_DEPTH;
use docnav_core::{FileStore, StructureIndex};
use serde::Serialize;
use tracing::info;

// Re-export validators
pub use duplicates::DuplicatePathValidator;
pub use graph::IncludeGraphValidator;
pub use includes::UnresolvedIncludeValidator;

/// Everything a validator may look at
pub struct ValidationContext<'a> {
    pub index: &'a StructureIndex,
    /// Root that reported file names are relative to
    pub docs_root: &'a Path,
    pub store: &'a dyn FileStore,
    /// Longest include chain accepted before `include_depth_exceeded`
    pub max_include_depth: usize,
}

impl<'a> ValidationContext<'a> {
    pub fn new(index: &'a StructureIndex, docs_root: &'a Path, store: &'a dyn FileStore) -> Self {
        Self {
            index,
            docs_root,
            store,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// `path` relative to the docs root, with `/` separators
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(self.docs_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Trait for structure validators
///
/// Validators inspect the index and return a diagnostic for every problem
/// they find.
pub trait Validator: Send + Sync {
    /// Get the validator's unique code (e.g., "NAV2" for include checks)
    fn code(&self) -> &'static str;

    /// Get a human-readable name for this validator
    fn name(&self) -> &'static str {
        "unnamed"
    }

    /// Validate and return any diagnostics
    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic>;
}

/// Outcome of a full validation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// False iff there is at least one error
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub validation_time_ms: u64,
}

/// Validation engine that orchestrates multiple validators
pub struct ValidationEngine {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Create a new empty validation engine
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Create an engine with every built-in validator
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_validator(Box::new(DuplicatePathValidator));
        engine.add_validator(Box::new(UnresolvedIncludeValidator));
        engine.add_validator(Box::new(IncludeGraphValidator));
        engine
    }

    /// Add a validator to the engine
    pub fn add_validator(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Get the number of registered validators
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Get the names of all registered validators
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run all registered validators
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for validator in &self.validators {
            diagnostics.extend(validator.validate(ctx));
        }
        diagnostics
    }

    /// Run all validators and split the findings by severity
    pub fn report(&self, ctx: &ValidationContext<'_>) -> ValidationReport {
        let started = Instant::now();
        let (errors, warnings) = self.validate(ctx).partition();
        let report = ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            validation_time_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            valid = report.valid,
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validation finished"
        );
        report
    }
}

/// Run the default checks over an index
pub fn validate_structure(
    index: &StructureIndex,
    docs_root: &Path,
    store: &dyn FileStore,
) -> ValidationReport {
    let ctx = ValidationContext::new(index, docs_root, store);
    ValidationEngine::with_defaults().report(&ctx)
}

//! Unresolved include validator

use std::collections::HashSet;

use docnav_core::diagnostics::{Diagnostic, DiagnosticKind};

use crate::{ValidationContext, Validator};

/// Reports include directives whose target file does not exist or cannot
/// be read
///
/// Either is an error: the including document stays navigable, but the
/// text it pulls in is absent.
///
/// # Diagnostic Codes
///
/// - `unresolved_include` (error)
pub struct UnresolvedIncludeValidator;

impl Validator for UnresolvedIncludeValidator {
    fn code(&self) -> &'static str {
        "NAV2"
    }

    fn name(&self) -> &'static str {
        "unresolved-includes"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        // The same directive is recorded by every document that expands it
        let mut reported = HashSet::new();

        for document in ctx.index.documents() {
            for include in &document.includes {
                let location = &include.source_location;
                if !reported.insert((location.file.clone(), location.line)) {
                    continue;
                }
                let target = ctx.display(&include.target_path);
                let (message, help) = if !ctx.store.exists(&include.target_path) {
                    (
                        format!("Include target '{}' not found", target),
                        "Create the file or fix the include path",
                    )
                } else if let Err(err) = ctx.store.read_file(&include.target_path) {
                    (
                        format!("Include target '{}' could not be read: {}", target, err),
                        "Check the file's permissions and that it is UTF-8",
                    )
                } else {
                    continue;
                };

                let mut diagnostic = Diagnostic::error(DiagnosticKind::UnresolvedInclude, message)
                    .with_file(ctx.display(&location.file))
                    .with_line(location.line)
                    .with_help(help);

                if let Some(directive) = location.resolved_from.as_deref() {
                    diagnostic = diagnostic.with_note(format!(
                        "reached through {}:{}",
                        ctx.display(&directive.file),
                        directive.line
                    ));
                }
                diagnostics.push(diagnostic);
            }
        }

        diagnostics
    }
}

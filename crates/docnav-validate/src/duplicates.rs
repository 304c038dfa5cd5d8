//! Duplicate section path validator
//!
//! The index keeps the last section it saw for a path and records a
//! warning while building. This validator reports those warnings and
//! re-derives duplicates from the section list, so findings survive even
//! when the build warnings were dropped.

use std::collections::{BTreeMap, HashSet};

use docnav_core::diagnostics::{Diagnostic, DiagnosticKind};
use docnav_core::IndexedSection;

use crate::{ValidationContext, Validator};

/// Reports section paths shared by more than one section
///
/// # Diagnostic Codes
///
/// - `duplicate_path` (warning): the later section shadows the earlier one
///   for `get_section`
pub struct DuplicatePathValidator;

impl Validator for DuplicatePathValidator {
    fn code(&self) -> &'static str {
        "NAV1"
    }

    fn name(&self) -> &'static str {
        "duplicate-paths"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic> {
        let index = ctx.index;
        let mut diagnostics: Vec<Diagnostic> = index
            .warnings()
            .iter()
            .filter(|w| w.kind == DiagnosticKind::DuplicatePath)
            .cloned()
            .collect();

        let mut seen: HashSet<(String, String, usize)> = diagnostics
            .iter()
            .filter_map(|d| Some((d.path.clone()?, d.file.clone()?, d.line?)))
            .collect();

        let mut by_path: BTreeMap<&str, Vec<&IndexedSection>> = BTreeMap::new();
        for section in index.sections() {
            by_path.entry(section.path.as_str()).or_default().push(section);
        }

        for (path, sections) in by_path.iter().filter(|(_, s)| s.len() > 1) {
            let first = &sections[0].source_location;
            let first_at = format!("{}:{}", index.display_path(&first.file), first.line);

            for section in &sections[1..] {
                let file = index.display_path(&section.source_location.file);
                let line = section.source_location.line;
                if !seen.insert((path.to_string(), file.clone(), line)) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::DuplicatePath,
                        format!(
                            "Duplicate section path '{}': {} and {}:{}",
                            path, first_at, file, line
                        ),
                    )
                    .with_path(*path)
                    .with_file(file)
                    .with_line(line)
                    .with_note(format!("first defined at {}", first_at)),
                );
            }
        }

        diagnostics
    }
}

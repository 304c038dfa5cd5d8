//! Response rendering
//!
//! Every command prints either pretty JSON (the default, for tools) or a
//! short human-readable text form.

use anyhow::{Context, Result};
use clap::ValueEnum;
use docnav_core::{
    Dependencies, EditOutcome, NavError, SearchResults, SectionNode, StructureView,
};
use docnav_validate::ValidationReport;
use serde::Serialize;
use serde_json::{json, Value};

use crate::service::{ElementsResponse, LevelResponse, Metadata, SectionResponse};

/// Output format for responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output for tool consumption
    #[default]
    Json,
    /// Human-readable text output
    Text,
}

/// A rendered response, ready in both formats
pub struct Reply {
    json: serde_json::Result<Value>,
    text: String,
}

impl Reply {
    pub fn new<T: Serialize>(value: &T, text: impl FnOnce(&T) -> String) -> Self {
        Self {
            json: serde_json::to_value(value),
            text: text(value),
        }
    }

    /// Print to stdout
    pub fn print(self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => {
                let value = self.json.context("Failed to serialize response")?;
                let json = serde_json::to_string_pretty(&value)
                    .context("Failed to serialize response to JSON")?;
                println!("{}", json);
            }
            OutputFormat::Text => println!("{}", self.text),
        }
        Ok(())
    }
}

/// Print a domain error. JSON goes to stdout so callers can parse it.
pub fn print_error(err: &NavError, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&json!({ "error": err.to_detail() }))
                .context("Failed to serialize error to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => eprintln!("{}", error_text(err)),
    }
    Ok(())
}

pub fn error_text(err: &NavError) -> String {
    let mut lines = vec![format!("error[{}]: {}", err.code(), err)];
    if let NavError::PathNotFound { suggestions, .. } = err {
        if !suggestions.is_empty() {
            lines.push(format!("  = help: did you mean {}?", suggestions.join(", ")));
        }
    }
    lines.join("\n")
}

pub fn structure_text(view: &StructureView) -> String {
    fn walk(nodes: &[SectionNode], indent: usize, lines: &mut Vec<String>) {
        for node in nodes {
            lines.push(format!(
                "{}{} [{}]  {}:{}",
                "  ".repeat(indent),
                node.section.title,
                node.section.path,
                node.section.location.file,
                node.section.location.line
            ));
            walk(&node.children, indent + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(&view.sections, 0, &mut lines);
    lines.push(format!("{} section(s)", view.total_sections));
    lines.join("\n")
}

pub fn section_text(section: &SectionResponse) -> String {
    format!(
        "{} [{}]\n  --> {}:{}\n  hash: {}\n\n{}",
        section.title,
        section.path,
        section.location.file,
        section.location.line,
        section.content_hash,
        section.content
    )
}

pub fn level_text(response: &LevelResponse) -> String {
    let mut lines: Vec<String> = response
        .sections
        .iter()
        .map(|s| format!("{} [{}]", s.title, s.path))
        .collect();
    lines.push(format!(
        "{} section(s) at level {}",
        response.count, response.level
    ));
    lines.join("\n")
}

pub fn search_text(results: &SearchResults) -> String {
    let mut lines = Vec::new();
    for hit in &results.results {
        lines.push(format!("{} [{}]  {}:{}", hit.title, hit.path, hit.file, hit.line));
        lines.push(format!("    {}", hit.context));
    }
    lines.push(format!(
        "{} of {} result(s) for '{}'",
        results.results.len(),
        results.total_results,
        results.query
    ));
    lines.join("\n")
}

pub fn elements_text(response: &ElementsResponse) -> String {
    let mut lines: Vec<String> = response
        .elements
        .iter()
        .map(|e| {
            format!(
                "{:<10} {}  {}:{}",
                e.element_type.as_str(),
                e.parent_section,
                e.location.file,
                e.location.line
            )
        })
        .collect();
    lines.push(format!("{} element(s)", response.count));
    lines.join("\n")
}

pub fn metadata_text(metadata: &Metadata) -> String {
    match metadata {
        Metadata::Project(project) => {
            let mut lines = vec![
                format!("Docs root: {}", project.docs_root),
                format!("Documents: {}", project.documents),
                format!("Files:     {}", project.total_files),
                format!("Sections:  {}", project.total_sections),
                format!("Words:     {}", project.total_words),
            ];
            for (format, count) in &project.formats {
                lines.push(format!("  {}: {}", format, count));
            }
            lines.join("\n")
        }
        Metadata::Section(section) => format!(
            "{} [{}]\n  --> {}:{}\n  level {}, {} word(s), {} subsection(s)",
            section.title,
            section.path,
            section.location.file,
            section.location.line,
            section.level,
            section.word_count,
            section.subsections
        ),
    }
}

pub fn dependencies_text(deps: &Dependencies) -> String {
    if deps.include_tree.is_empty() {
        return "No includes".to_string();
    }
    let mut lines = Vec::new();
    for (file, targets) in &deps.include_tree {
        lines.push(file.clone());
        lines.extend(targets.iter().map(|t| format!("  -> {}", t)));
    }
    lines.join("\n")
}

pub fn validation_text(report: &ValidationReport) -> String {
    if report.errors.is_empty() && report.warnings.is_empty() {
        return "✓ No issues found".to_string();
    }
    let mut blocks: Vec<String> = report
        .errors
        .iter()
        .chain(&report.warnings)
        .map(|d| d.to_string())
        .collect();
    blocks.push(format!(
        "Found {} error(s) and {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    ));
    blocks.join("\n\n")
}

pub fn edit_text(outcome: &EditOutcome) -> String {
    format!(
        "Updated {} in {} (lines {}-{})\n  hash: {}",
        outcome.path, outcome.file, outcome.start_line, outcome.end_line, outcome.new_hash
    )
}

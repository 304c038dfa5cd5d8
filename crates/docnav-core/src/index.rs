//! In-memory structure index
//!
//! Every section of every document lives in one arena, in document order
//! and depth-first within each document. Parent and child links are arena
//! indices, so the tree can be walked in both directions without
//! reference cycles.
//!
//! Paths are looked up through a flat map. When two sections share a path
//! the later one wins the lookup, both stay in the tree, and a
//! `duplicate_path` warning is recorded.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use docnav_model::{
    CrossReference, Document, DocumentFormat, Element, ElementType, IncludeInfo, Section,
    SourceLocation,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{NavError, Result};

/// Maximum number of "did you mean" suggestions
pub const MAX_SUGGESTIONS: usize = 5;

/// A section stored in the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSection {
    pub title: String,
    pub level: u8,
    pub path: String,
    pub source_location: SourceLocation,
    pub anchor: Option<String>,
    /// Format of the document the section belongs to
    pub format: DocumentFormat,
    /// Distance from the document's root section (roots are 0)
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Index into [`StructureIndex::documents`]
    pub document: usize,
}

/// Per-document data kept alongside the sections
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedDocument {
    pub file_path: PathBuf,
    pub title: String,
    pub format: DocumentFormat,
    /// Top-level sections of this document
    pub roots: Vec<usize>,
    pub attributes: BTreeMap<String, String>,
    pub includes: Vec<IncludeInfo>,
    pub cross_references: Vec<CrossReference>,
}

/// Where a section is, with paths relative to the docs root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationView {
    pub file: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    /// `file:line` of the include directive that pulled the section in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_from: Option<String>,
}

/// A section without its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub path: String,
    pub title: String,
    pub level: u8,
    pub location: LocationView,
}

/// A section with its (possibly pruned) subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionNode {
    #[serde(flatten)]
    pub section: SectionSummary,
    pub children: Vec<SectionNode>,
}

/// Result of [`StructureIndex::get_structure`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureView {
    pub sections: Vec<SectionNode>,
    /// Number of sections in the whole index, regardless of pruning
    pub total_sections: usize,
}

/// Result of [`StructureIndex::get_dependencies`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependencies {
    /// Including file -> included files, relative to the docs root
    pub include_tree: BTreeMap<String, Vec<String>>,
    /// Reserved; always empty
    pub cross_references: Vec<CrossReference>,
}

/// The structure index
#[derive(Debug, Clone, Default)]
pub struct StructureIndex {
    root: Option<PathBuf>,
    sections: Vec<IndexedSection>,
    roots: Vec<usize>,
    by_path: HashMap<String, usize>,
    by_file: BTreeMap<PathBuf, Vec<usize>>,
    documents: Vec<IndexedDocument>,
    elements: Vec<Element>,
    warnings: Vec<Diagnostic>,
}

impl StructureIndex {
    /// Create an empty index without a docs root
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index whose displayed paths are relative to `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Populate the index from parsed documents, replacing any previous
    /// content. Returns the warnings found while building.
    pub fn build_from_documents(&mut self, documents: Vec<Document>) -> Vec<Diagnostic> {
        let root = self.root.take();
        *self = Self {
            root,
            ..Self::default()
        };

        for document in documents {
            self.add_document(document);
        }

        info!(
            documents = self.documents.len(),
            sections = self.sections.len(),
            elements = self.elements.len(),
            warnings = self.warnings.len(),
            "Built structure index"
        );
        self.warnings.clone()
    }

    fn add_document(&mut self, document: Document) {
        let doc_idx = self.documents.len();
        let Document {
            file_path,
            title,
            format,
            sections,
            elements,
            attributes,
            cross_references,
            includes,
        } = document;

        let roots: Vec<usize> = sections
            .into_iter()
            .map(|section| self.insert_section(section, None, 0, format, doc_idx))
            .collect();
        self.roots.extend(&roots);
        self.elements.extend(elements);

        debug!(file = %file_path.display(), sections = roots.len(), "Indexed document");
        self.documents.push(IndexedDocument {
            file_path,
            title,
            format,
            roots,
            attributes,
            includes,
            cross_references,
        });
    }

    fn insert_section(
        &mut self,
        section: Section,
        parent: Option<usize>,
        depth: usize,
        format: DocumentFormat,
        document: usize,
    ) -> usize {
        let Section {
            title,
            level,
            path,
            source_location,
            children,
            anchor,
        } = section;

        let idx = self.sections.len();
        self.by_file
            .entry(source_location.file.clone())
            .or_default()
            .push(idx);
        self.sections.push(IndexedSection {
            title,
            level,
            path,
            source_location,
            anchor,
            format,
            depth,
            parent,
            children: Vec::new(),
            document,
        });
        self.register_path(idx);

        for child in children {
            let child_idx = self.insert_section(child, Some(idx), depth + 1, format, document);
            self.sections[idx].children.push(child_idx);
        }
        idx
    }

    fn register_path(&mut self, idx: usize) {
        let path = self.sections[idx].path.clone();
        let Some(previous) = self.by_path.insert(path.clone(), idx) else {
            return;
        };

        let first = &self.sections[previous].source_location;
        let second = &self.sections[idx].source_location;
        let first_at = format!("{}:{}", self.display_path(&first.file), first.line);
        let second_file = self.display_path(&second.file);
        let second_line = second.line;

        warn!(path = %path, first = %first_at, "Duplicate section path");
        self.warnings.push(
            Diagnostic::warning(
                DiagnosticKind::DuplicatePath,
                format!(
                    "Duplicate section path '{}': {} and {}:{}; lookups return the later one",
                    path, first_at, second_file, second_line
                ),
            )
            .with_path(path)
            .with_file(second_file)
            .with_line(second_line)
            .with_note(format!("first defined at {}", first_at))
            .with_help("Rename one of the headings so their paths differ"),
        );
    }

    /// Docs root, if the index has one
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the index holds no sections
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All sections in document order
    pub fn sections(&self) -> &[IndexedSection] {
        &self.sections
    }

    /// A section by arena index
    pub fn section(&self, idx: usize) -> Option<&IndexedSection> {
        self.sections.get(idx)
    }

    /// Arena index of the section a path resolves to
    pub fn position(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Look up a section by path
    pub fn get(&self, path: &str) -> Option<&IndexedSection> {
        self.position(path).map(|idx| &self.sections[idx])
    }

    /// Look up a section by path, with suggestions when it does not exist
    pub fn get_section(&self, path: &str) -> Result<&IndexedSection> {
        self.get(path).ok_or_else(|| NavError::PathNotFound {
            path: path.to_string(),
            suggestions: self.suggest_paths(path, MAX_SUGGESTIONS),
        })
    }

    /// Indexed paths close to `path`: containing it, or within a small
    /// edit distance
    pub fn suggest_paths(&self, path: &str, limit: usize) -> Vec<String> {
        let query = path.to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let threshold = (query.chars().count() / 3).max(2);

        let mut scored: Vec<(usize, &String)> = self
            .by_path
            .keys()
            .filter_map(|candidate| {
                let lower = candidate.to_lowercase();
                let rank = if lower.contains(&query) {
                    0
                } else {
                    edit_distance(&query, &lower)
                };
                (rank <= threshold).then_some((rank, candidate))
            })
            .collect();

        scored.sort();
        scored
            .into_iter()
            .take(limit)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// The section tree, pruned below `max_depth` (roots are depth 0)
    pub fn get_structure(&self, max_depth: Option<usize>) -> StructureView {
        StructureView {
            sections: self
                .roots
                .iter()
                .map(|&idx| self.node(idx, max_depth))
                .collect(),
            total_sections: self.sections.len(),
        }
    }

    fn node(&self, idx: usize, max_depth: Option<usize>) -> SectionNode {
        let section = &self.sections[idx];
        let children = match max_depth {
            Some(max) if section.depth >= max => Vec::new(),
            _ => section
                .children
                .iter()
                .map(|&child| self.node(child, max_depth))
                .collect(),
        };
        SectionNode {
            section: self.summary(section),
            children,
        }
    }

    /// Flat view of a section
    pub fn summary(&self, section: &IndexedSection) -> SectionSummary {
        SectionSummary {
            path: section.path.clone(),
            title: section.title.clone(),
            level: section.level,
            location: self.location_view(&section.source_location),
        }
    }

    /// Location with root-relative paths
    pub fn location_view(&self, location: &SourceLocation) -> LocationView {
        LocationView {
            file: self.display_path(&location.file),
            line: location.line,
            end_line: location.end_line,
            included_from: location
                .resolved_from
                .as_deref()
                .map(|d| format!("{}:{}", self.display_path(&d.file), d.line)),
        }
    }

    /// Sections with the given heading level, in document order
    pub fn sections_at_level(&self, level: u8) -> Vec<&IndexedSection> {
        self.sections.iter().filter(|s| s.level == level).collect()
    }

    /// Sections whose heading lives in `file`, in document order
    pub fn sections_in_file(&self, file: &Path) -> Vec<&IndexedSection> {
        self.by_file
            .get(file)
            .map(|ids| ids.iter().map(|&idx| &self.sections[idx]).collect())
            .unwrap_or_default()
    }

    /// Every physical file that holds at least one section
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.by_file.keys().map(PathBuf::as_path)
    }

    /// Indexed documents in build order
    pub fn documents(&self) -> &[IndexedDocument] {
        &self.documents
    }

    /// Every element in document order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements of a type, inside sections whose path starts with a prefix
    pub fn find_elements(
        &self,
        element_type: Option<ElementType>,
        section_prefix: Option<&str>,
    ) -> Vec<&Element> {
        self.elements
            .iter()
            .filter(|e| element_type.map_or(true, |t| e.element_type == t))
            .filter(|e| section_prefix.map_or(true, |p| e.parent_section.starts_with(p)))
            .collect()
    }

    /// Warnings recorded while building
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Include relationships between files
    pub fn get_dependencies(&self) -> Dependencies {
        let mut include_tree: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for document in &self.documents {
            let base = self
                .root
                .as_deref()
                .or_else(|| document.file_path.parent());

            for include in &document.includes {
                let from = relative_display(&include.source_location.file, base);
                let to = relative_display(&include.target_path, base);
                let targets = include_tree.entry(from).or_default();
                if !targets.contains(&to) {
                    targets.push(to);
                }
            }
        }

        Dependencies {
            include_tree,
            cross_references: Vec::new(),
        }
    }

    /// A path for display: relative to the docs root when inside it
    pub fn display_path(&self, path: &Path) -> String {
        relative_display(path, self.root.as_deref())
    }
}

fn relative_display(path: &Path, base: Option<&Path>) -> String {
    let relative = base
        .and_then(|b| path.strip_prefix(b).ok())
        .unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// Levenshtein distance over chars
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

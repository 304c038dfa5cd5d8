//! Tool layer over the structure index
//!
//! `DocsService` owns the current index snapshot and exposes every
//! operation the CLI offers. Reads work on an `Arc` snapshot and never
//! block each other; `reload` builds a new index and swaps it in. Edits
//! are serialised per target file and rebuilds are serialised globally, so
//! a later swap never installs an older view of the tree.
//!
//! Primitive parameters arrive as signed integers so that out-of-range
//! values are rejected with a message instead of being clamped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use docnav_core::diagnostics::Diagnostic;
use docnav_core::{
    load_documents, search, ContentEditor, Dependencies, EditOutcome, FileStore, FsStore,
    InsertPosition, LocationView, NavError, Result, SearchOptions, SearchResults, SectionSummary,
    StructureIndex, StructureView,
};
use docnav_model::{DocumentFormat, ElementType};
use docnav_validate::{ValidationContext, ValidationEngine, ValidationReport};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;

/// A section with its current text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionResponse {
    pub path: String,
    pub title: String,
    pub level: u8,
    pub format: DocumentFormat,
    pub location: LocationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Paths of direct subsections
    pub children: Vec<String>,
    pub content: String,
    /// Pass back as `expected_hash` to guard an update
    pub content_hash: String,
}

/// Sections at one heading level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelResponse {
    pub level: i64,
    pub sections: Vec<SectionSummary>,
    pub count: usize,
}

/// One element in an elements listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementView {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub parent_section: String,
    pub location: LocationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementsResponse {
    pub elements: Vec<ElementView>,
    pub count: usize,
}

/// Per-file numbers in project metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetadata {
    pub file: String,
    pub sections: usize,
    pub words: usize,
}

/// Whole-tree metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMetadata {
    pub docs_root: String,
    pub documents: usize,
    pub total_files: usize,
    pub total_sections: usize,
    pub total_words: usize,
    /// Document count per format
    pub formats: BTreeMap<String, usize>,
    pub files: Vec<FileMetadata>,
}

/// Metadata of one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionMetadata {
    pub path: String,
    pub title: String,
    pub level: u8,
    pub format: DocumentFormat,
    pub location: LocationView,
    pub word_count: usize,
    pub subsections: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metadata {
    Project(ProjectMetadata),
    Section(SectionMetadata),
}

/// Owns the index snapshot and the per-file write locks
pub struct DocsService {
    root: PathBuf,
    settings: Settings,
    store: Arc<dyn FileStore>,
    index: RwLock<Arc<StructureIndex>>,
    /// Held from the first file read of a rebuild until its swap
    reload_lock: Mutex<()>,
    file_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl DocsService {
    /// Open a docs root on the local filesystem and build the index
    pub fn open(root: &Path, settings: Settings) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|source| NavError::io(root, source))?;
        if !root.is_dir() {
            return Err(NavError::invalid(
                "docs_root",
                format!("{} is not a directory", root.display()),
            ));
        }
        Self::with_store(root, settings, Arc::new(FsStore))
    }

    /// Build a service over any file store. `root` is used as given.
    pub fn with_store(
        root: PathBuf,
        settings: Settings,
        store: Arc<dyn FileStore>,
    ) -> Result<Self> {
        let service = Self {
            root,
            settings,
            store,
            index: RwLock::new(Arc::new(StructureIndex::new())),
            reload_lock: Mutex::new(()),
            file_locks: Mutex::new(HashMap::new()),
        };
        service.reload()?;
        Ok(service)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The current index. Holders keep a consistent view across reloads.
    pub fn snapshot(&self) -> Arc<StructureIndex> {
        self.index.read().clone()
    }

    /// Re-read every document and swap in a fresh index
    pub fn reload(&self) -> Result<Vec<Diagnostic>> {
        let _guard = self.reload_lock.lock();
        let options = self.settings.load_options(&self.root);
        let documents = load_documents(&self.root, &options, self.store.as_ref())?;

        let mut index = StructureIndex::with_root(&self.root);
        let warnings = index.build_from_documents(documents);
        *self.index.write() = Arc::new(index);

        debug!(root = %self.root.display(), warnings = warnings.len(), "Reloaded index");
        Ok(warnings)
    }

    /// Section tree, optionally pruned
    pub fn get_structure(&self, max_depth: Option<i64>) -> Result<StructureView> {
        let max_depth = max_depth
            .map(|d| non_negative("max_depth", d))
            .transpose()?;
        Ok(self.snapshot().get_structure(max_depth))
    }

    /// One section with its text and hash
    pub fn get_section(&self, path: &str) -> Result<SectionResponse> {
        let index = self.snapshot();
        let section = index.get_section(path)?;
        let current = ContentEditor::new(&index, self.store.as_ref()).read_section(path)?;

        Ok(SectionResponse {
            path: section.path.clone(),
            title: section.title.clone(),
            level: section.level,
            format: section.format,
            location: index.location_view(&section.source_location),
            anchor: section.anchor.clone(),
            children: section
                .children
                .iter()
                .filter_map(|&c| index.section(c))
                .map(|c| c.path.clone())
                .collect(),
            content: current.content,
            content_hash: current.content_hash,
        })
    }

    /// Every section with the given heading level
    pub fn get_sections_at_level(&self, level: i64) -> Result<LevelResponse> {
        if level <= 0 {
            return Err(NavError::invalid(
                "level",
                format!("level must be positive (got {})", level),
            ));
        }

        let index = self.snapshot();
        let sections: Vec<SectionSummary> = match u8::try_from(level) {
            Ok(level) => index
                .sections_at_level(level)
                .into_iter()
                .map(|s| index.summary(s))
                .collect(),
            Err(_) => Vec::new(),
        };
        Ok(LevelResponse {
            level,
            count: sections.len(),
            sections,
        })
    }

    /// Literal search over titles and section bodies
    pub fn search(
        &self,
        query: &str,
        scope: Option<&str>,
        case_sensitive: bool,
        max_results: Option<i64>,
    ) -> Result<SearchResults> {
        let max_results = match max_results {
            Some(n) => non_negative("max_results", n)?,
            None => self.settings.search.max_results,
        };
        let options = SearchOptions {
            scope: scope.map(str::to_string),
            case_sensitive,
            max_results: Some(max_results),
            snippet_width: self.settings.search.snippet_width,
        };
        search(&self.snapshot(), self.store.as_ref(), query, &options)
    }

    /// Indexed elements, filtered by type and section path prefix
    pub fn get_elements(
        &self,
        element_type: Option<&str>,
        section_path: Option<&str>,
        include_content: bool,
        content_limit: Option<i64>,
    ) -> Result<ElementsResponse> {
        let element_type = element_type
            .map(|name| {
                ElementType::from_str(name).map_err(|name| {
                    NavError::invalid(
                        "element_type",
                        format!(
                            "unknown element type '{}'; expected one of: {}",
                            name,
                            ElementType::valid_names()
                        ),
                    )
                })
            })
            .transpose()?;
        let content_limit = content_limit
            .map(|n| non_negative("content_limit", n))
            .transpose()?;

        let index = self.snapshot();
        let elements: Vec<ElementView> = index
            .find_elements(element_type, section_path)
            .into_iter()
            .map(|e| ElementView {
                element_type: e.element_type,
                parent_section: e.parent_section.clone(),
                location: index.location_view(&e.source_location),
                content: include_content
                    .then(|| e.content.as_deref().map(|c| truncate(c, content_limit)))
                    .flatten(),
                attributes: e.attributes.clone(),
            })
            .collect();

        Ok(ElementsResponse {
            count: elements.len(),
            elements,
        })
    }

    /// Project metadata, or one section's when `path` is given
    pub fn get_metadata(&self, path: Option<&str>) -> Result<Metadata> {
        let index = self.snapshot();

        if let Some(path) = path {
            let section = index.get_section(path)?;
            let content = ContentEditor::new(&index, self.store.as_ref()).read_section(path)?;
            return Ok(Metadata::Section(SectionMetadata {
                path: section.path.clone(),
                title: section.title.clone(),
                level: section.level,
                format: section.format,
                location: index.location_view(&section.source_location),
                word_count: word_count(&content.content),
                subsections: section.children.len(),
            }));
        }

        let mut files = Vec::new();
        for file in index.files() {
            let text = self
                .store
                .read_file(file)
                .map_err(|source| NavError::io(file, source))?;
            files.push(FileMetadata {
                file: index.display_path(file),
                sections: index.sections_in_file(file).len(),
                words: word_count(&text),
            });
        }

        let mut formats = BTreeMap::new();
        for document in index.documents() {
            *formats.entry(document.format.to_string()).or_insert(0) += 1;
        }

        Ok(Metadata::Project(ProjectMetadata {
            docs_root: self.root.display().to_string(),
            documents: index.documents().len(),
            total_files: files.len(),
            total_sections: index.len(),
            total_words: files.iter().map(|f| f.words).sum(),
            formats,
            files,
        }))
    }

    pub fn get_dependencies(&self) -> Dependencies {
        self.snapshot().get_dependencies()
    }

    /// Structural checks over the current snapshot. Include chains are
    /// measured against the same depth limit the parser expanded with.
    pub fn validate(&self) -> ValidationReport {
        let index = self.snapshot();
        let ctx = ValidationContext::new(&index, &self.root, self.store.as_ref())
            .with_max_include_depth(self.settings.workspace.max_include_depth);
        ValidationEngine::with_defaults().report(&ctx)
    }

    /// Replace a section; see [`ContentEditor::update_section`]
    pub fn update_section(
        &self,
        path: &str,
        content: &str,
        preserve_title: bool,
        expected_hash: Option<&str>,
    ) -> Result<EditOutcome> {
        self.edit(path, |editor| {
            editor.update_section(path, content, preserve_title, expected_hash)
        })
    }

    /// Insert content relative to a section. `position` is one of
    /// `before`, `after` or `append`.
    pub fn insert_content(&self, path: &str, position: &str, content: &str) -> Result<EditOutcome> {
        let position = InsertPosition::from_str(position)?;
        self.edit(path, |editor| editor.insert_content(path, position, content))
    }

    fn edit<F>(&self, path: &str, op: F) -> Result<EditOutcome>
    where
        F: FnOnce(&ContentEditor<'_>) -> Result<EditOutcome>,
    {
        let file = self
            .snapshot()
            .get_section(path)?
            .source_location
            .file
            .clone();
        let lock = self.lock_for(&file);
        let _guard = lock.lock();

        // Another edit to this file may have finished while we waited
        let index = self.snapshot();
        let outcome = op(&ContentEditor::new(&index, self.store.as_ref()))?;

        if self.settings.edit.rebuild_after_edit {
            self.reload()?;
        }
        info!(path, file = %outcome.file, "Edit applied");
        Ok(outcome)
    }

    fn lock_for(&self, file: &Path) -> Arc<Mutex<()>> {
        self.file_locks
            .lock()
            .entry(file.to_path_buf())
            .or_default()
            .clone()
    }
}

fn non_negative(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        NavError::invalid(name, format!("{} must be non-negative (got {})", name, value))
    })
}

fn truncate(content: &str, limit: Option<usize>) -> String {
    match limit {
        Some(limit) => content.chars().take(limit).collect(),
        None => content.to_string(),
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

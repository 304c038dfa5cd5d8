//! Document discovery and loading
//!
//! Finds every documentation file under a docs root and parses it. Files
//! that are reached through another document's `include::` are skipped by
//! default, so each included chapter is indexed once (as part of its
//! parent) instead of twice.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use docnav_model::Document;
use glob::{glob, Pattern};
use tracing::debug;

use crate::error::{NavError, Result};
use crate::include::normalize_path;
use crate::index::StructureIndex;
use crate::parser::{parse_file, ParserConfig};
use crate::store::FileStore;

/// Default extensions picked up by discovery
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["adoc", "asciidoc", "md"];

/// What to load from a docs root
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File extensions to index, without the dot
    pub extensions: Vec<String>,
    /// Leave out files that another indexed document includes
    pub skip_included_files: bool,
    /// Parser settings
    pub parser: ParserConfig,
}

impl LoadOptions {
    /// Default options for a docs root
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            skip_included_files: true,
            parser: ParserConfig::with_root(root),
        }
    }
}

/// Every file under `root` with one of `extensions`, sorted
pub fn discover_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let base = Pattern::escape(&root.display().to_string());
    let mut files = BTreeSet::new();

    for ext in extensions {
        let pattern = format!("{}/**/*.{}", base.trim_end_matches('/'), ext);
        let entries = glob(&pattern).map_err(|e| {
            NavError::invalid("docs_root", format!("Invalid glob pattern {}: {}", pattern, e))
        })?;

        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    files.insert(normalize_path(&path));
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().to_path_buf();
                    return Err(NavError::io(path, e.into_error()));
                }
            }
        }
    }

    debug!(root = %root.display(), count = files.len(), "Discovered documentation files");
    Ok(files.into_iter().collect())
}

/// Discover and parse every document under the configured root.
///
/// A file that cannot be read (or is not UTF-8) fails the whole load with
/// [`NavError::Io`] naming it.
pub fn load_documents(
    root: &Path,
    options: &LoadOptions,
    store: &dyn FileStore,
) -> Result<Vec<Document>> {
    let files = discover_files(root, &options.extensions)?;
    let mut documents = Vec::with_capacity(files.len());

    for file in &files {
        documents.push(parse_file(file, &options.parser, store)?);
    }

    if options.skip_included_files {
        documents = drop_included(documents);
    }
    Ok(documents)
}

/// Discover, parse and index everything under `root`
pub fn load_index(
    root: &Path,
    options: &LoadOptions,
    store: &dyn FileStore,
) -> Result<StructureIndex> {
    let documents = load_documents(root, options, store)?;
    let mut index = StructureIndex::with_root(root);
    index.build_from_documents(documents);
    Ok(index)
}

/// Remove documents reachable through includes from a document nobody
/// includes. Files that only include each other in a loop are all kept.
pub fn drop_included(documents: Vec<Document>) -> Vec<Document> {
    let edges: Vec<(PathBuf, PathBuf)> = documents
        .iter()
        .flat_map(|d| d.includes.iter())
        .map(|inc| {
            (
                normalize_path(&inc.source_location.file),
                normalize_path(&inc.target_path),
            )
        })
        .filter(|(from, to)| from != to)
        .collect();

    let included: HashSet<&PathBuf> = edges.iter().map(|(_, to)| to).collect();
    let roots: Vec<PathBuf> = documents
        .iter()
        .map(|d| normalize_path(&d.file_path))
        .filter(|p| !included.contains(p))
        .collect();

    let mut reachable: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<PathBuf> = roots.iter().cloned().collect();
    while let Some(node) = queue.pop_front() {
        for (from, to) in &edges {
            if *from == node && reachable.insert(to.clone()) {
                queue.push_back(to.clone());
            }
        }
    }

    documents
        .into_iter()
        .filter(|d| {
            let keep = !reachable.contains(&normalize_path(&d.file_path));
            if !keep {
                debug!(file = %d.file_path.display(), "Skipping included file");
            }
            keep
        })
        .collect()
}

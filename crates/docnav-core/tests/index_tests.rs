//! Integration tests for building and querying the structure index
//!
//! Every test writes a small docs tree into a temp directory and loads it
//! through discovery, the parsers and the index, the way the CLI does.

use std::fs;
use std::path::Path;

use docnav_core::{load_index, DiagnosticKind, FsStore, LoadOptions, SectionNode, StructureIndex};
use tempfile::TempDir;

/// Write `files` under a fresh temp dir
fn docs_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn load(root: &Path) -> StructureIndex {
    load_index(root, &LoadOptions::for_root(root), &FsStore).unwrap()
}

fn max_node_depth(nodes: &[SectionNode], depth: usize) -> Option<usize> {
    nodes
        .iter()
        .map(|n| max_node_depth(&n.children, depth + 1).unwrap_or(depth))
        .max()
}

fn count_nodes(nodes: &[SectionNode]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}

const NESTED: &str = "= Manual\n\n== Chapter\n\n=== Section\n\n==== Detail\n\ntext\n";

#[test]
fn test_max_depth_zero_shows_only_documents() {
    let dir = docs_tree(&[("manual.adoc", NESTED)]);
    let index = load(dir.path());

    let view = index.get_structure(Some(0));
    assert_eq!(view.sections.len(), 1);
    assert_eq!(view.sections[0].section.path, "manual");
    assert!(view.sections[0].children.is_empty());
    assert_eq!(view.total_sections, 4);
}

#[test]
fn test_max_depth_one_includes_direct_children() {
    let dir = docs_tree(&[("manual.adoc", NESTED)]);
    let index = load(dir.path());

    let view = index.get_structure(Some(1));
    let children = &view.sections[0].children;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].section.path, "manual:chapter");
    assert!(children[0].children.is_empty());
}

#[test]
fn test_max_depth_is_monotonic() {
    let dir = docs_tree(&[("manual.adoc", NESTED), ("other.md", "# Other\n\n## A\n\n### B\n")]);
    let index = load(dir.path());

    let mut previous = 0;
    for n in 0..6 {
        let view = index.get_structure(Some(n));
        let deepest = max_node_depth(&view.sections, 0).unwrap();
        assert!(deepest <= n, "depth {} exceeds max_depth {}", deepest, n);

        let count = count_nodes(&view.sections);
        assert!(count >= previous);
        previous = count;
    }
    assert_eq!(previous, index.get_structure(None).total_sections);
}

#[test]
fn test_every_structure_path_resolves() {
    let dir = docs_tree(&[
        ("guide/index.adoc", "= Guide\n\ninclude::install.adoc[]\n\n== Usage\n"),
        ("guide/install.adoc", "== Install\n\n=== Linux\n\n=== macOS\n"),
        ("notes.md", "# Notes\n\n## Ideas\n\n```\n## not a heading\n```\n"),
    ]);
    let index = load(dir.path());

    fn walk(index: &StructureIndex, nodes: &[SectionNode]) {
        for node in nodes {
            let found = index.get_section(&node.section.path).unwrap();
            assert_eq!(found.title, node.section.title);
            walk(index, &node.children);
        }
    }
    walk(&index, &index.get_structure(None).sections);

    assert!(index.get("guide/index:install.linux").is_some());
    assert!(index.get("guide/install").is_none());
    assert_eq!(index.len(), 7);
}

#[test]
fn test_included_sections_point_at_their_file() {
    let dir = docs_tree(&[
        ("main.adoc", "= Main\n\ninclude::chapter.adoc[]\n"),
        ("chapter.adoc", "== Chapter\n\nBody\n"),
    ]);
    let index = load(dir.path());

    let chapter = index.get_section("main:chapter").unwrap();
    let view = index.location_view(&chapter.source_location);
    assert_eq!(view.file, "chapter.adoc");
    assert_eq!(view.line, 1);
    assert_eq!(view.end_line, Some(3));
    assert_eq!(view.included_from.as_deref(), Some("main.adoc:3"));
}

#[test]
fn test_duplicate_paths_last_one_wins() {
    let dir = docs_tree(&[
        ("guide.adoc", "= Guide\n\n== Introduction\n\nFrom AsciiDoc.\n"),
        ("guide.md", "# Guide\n\n## Introduction\n\nFrom Markdown.\n"),
    ]);
    let index = load(dir.path());

    let duplicates: Vec<_> = index
        .warnings()
        .iter()
        .filter(|w| w.kind == DiagnosticKind::DuplicatePath)
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates[0].message.contains("guide.adoc"));

    let intro = index.get_section("guide:introduction").unwrap();
    assert!(intro.source_location.file.ends_with("guide.md"));

    // The tree keeps both copies
    assert_eq!(index.get_structure(None).sections.len(), 2);
    assert_eq!(index.len(), 4);
}

#[test]
fn test_sections_at_unused_level_is_empty() {
    let dir = docs_tree(&[("manual.adoc", NESTED)]);
    let index = load(dir.path());

    assert!(index.sections_at_level(99).is_empty());
    let titles: Vec<&str> = index
        .sections_at_level(1)
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Chapter"]);
}

#[test]
fn test_missing_include_keeps_document_navigable() {
    let dir = docs_tree(&[(
        "main.adoc",
        "= Main\n\n== Setup\n\ninclude::nonexistent_file.adoc[]\n",
    )]);
    let index = load(dir.path());

    assert!(index.get_section("main:setup").is_ok());
    let deps = index.get_dependencies();
    assert_eq!(
        deps.include_tree.get("main.adoc"),
        Some(&vec!["nonexistent_file.adoc".to_string()])
    );
}

#[test]
fn test_mutual_includes_do_not_hang() {
    let dir = docs_tree(&[
        ("a.adoc", "= A\n\ninclude::b.adoc[]\n"),
        ("b.adoc", "= B\n\n== From B\n\ninclude::a.adoc[]\n"),
    ]);
    let index = load(dir.path());

    assert!(index.get("a").is_some());
    assert!(index.get("b").is_some());
    let deps = index.get_dependencies();
    assert_eq!(deps.include_tree["a.adoc"], vec!["b.adoc"]);
    assert_eq!(deps.include_tree["b.adoc"], vec!["a.adoc"]);
}

#[test]
fn test_dependencies_skip_documents_without_includes() {
    let dir = docs_tree(&[
        ("main.adoc", "= Main\n\ninclude::chapters/one.adoc[]\n"),
        ("chapters/one.adoc", "== One\n\ninclude::two.adoc[]\n"),
        ("chapters/two.adoc", "== Two\n"),
        ("plain.md", "# Plain\n"),
    ]);
    let index = load(dir.path());
    let deps = index.get_dependencies();

    assert_eq!(deps.include_tree.len(), 2);
    assert_eq!(deps.include_tree["main.adoc"], vec!["chapters/one.adoc"]);
    assert_eq!(deps.include_tree["chapters/one.adoc"], vec!["chapters/two.adoc"]);
    assert!(deps.cross_references.is_empty());

    let json = serde_json::to_value(&deps).unwrap();
    assert!(json.get("cross_references").is_some());
}

#[test]
fn test_not_found_carries_suggestions() {
    let dir = docs_tree(&[("manual.adoc", NESTED)]);
    let index = load(dir.path());

    let err = index.get_section("manual:chaptr").unwrap_err();
    assert_eq!(err.code(), "PATH_NOT_FOUND");
    let detail = err.to_detail();
    let suggestions = detail.details.unwrap()["suggestions"].clone();
    assert_eq!(suggestions[0], "manual:chapter");
}

#[test]
fn test_empty_tree() {
    let dir = TempDir::new().unwrap();
    let index = load(dir.path());

    assert!(index.is_empty());
    assert_eq!(index.get_structure(None).total_sections, 0);
    assert!(index.get_dependencies().include_tree.is_empty());
}

//! Integration tests for structure validation over real docs trees

use std::fs;
use std::path::Path;

use docnav_core::{load_index, DiagnosticKind, FsStore, LoadOptions, StructureIndex};
use docnav_validate::{validate_structure, ValidationReport};
use tempfile::TempDir;

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

fn load(root: &Path, skip_included_files: bool) -> StructureIndex {
    let mut options = LoadOptions::for_root(root);
    options.skip_included_files = skip_included_files;
    load_index(root, &options, &FsStore).unwrap()
}

fn kinds(report: &ValidationReport) -> Vec<DiagnosticKind> {
    report
        .errors
        .iter()
        .chain(&report.warnings)
        .map(|d| d.kind)
        .collect()
}

#[test]
fn test_clean_tree_is_valid() {
    let dir = docs_tree(&[
        ("index.adoc", "= Handbook\n\ninclude::chapters/intro.adoc[]\n"),
        ("chapters/intro.adoc", "== Intro\n\nHello.\n"),
        ("faq.md", "# FAQ\n\n## Why\n"),
    ]);
    let index = load(dir.path(), true);
    let report = validate_structure(&index, dir.path(), &FsStore);

    assert!(report.valid, "unexpected findings: {:?}", kinds(&report));
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_unreadable_include_target_is_reported() {
    let dir = docs_tree(&[("main.adoc", "= Main\n\ninclude::legacy.txt[]\n")]);
    fs::write(dir.path().join("legacy.txt"), b"Caf\xe9 au lait\n").unwrap();
    let index = load(dir.path(), true);
    let report = validate_structure(&index, dir.path(), &FsStore);

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    let error = &report.errors[0];
    assert_eq!(error.kind, DiagnosticKind::UnresolvedInclude);
    assert!(error.message.starts_with("Include target 'legacy.txt' could not be read"));
    assert_eq!(error.line, Some(3));
}

#[test]
fn test_unresolved_include_makes_tree_invalid() {
    let dir = docs_tree(&[(
        "main.adoc",
        "= Main\n\n== Setup\n\ninclude::nonexistent_file.adoc[]\n",
    )]);
    let index = load(dir.path(), true);
    let report = validate_structure(&index, dir.path(), &FsStore);

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, DiagnosticKind::UnresolvedInclude);
    assert!(report.errors[0].message.contains("nonexistent_file.adoc"));

    // Still navigable
    assert!(index.get_section("main:setup").is_ok());
}

#[test]
fn test_mutual_includes_are_reported() {
    let dir = docs_tree(&[
        ("a.adoc", "= A\n\ninclude::b.adoc[]\n"),
        ("b.adoc", "= B\n\ninclude::a.adoc[]\n"),
    ]);
    let index = load(dir.path(), true);
    let report = validate_structure(&index, dir.path(), &FsStore);

    assert!(!report.valid);
    let circular: Vec<_> = report
        .errors
        .iter()
        .filter(|d| d.kind == DiagnosticKind::CircularInclude)
        .collect();
    assert_eq!(circular.len(), 1);
    assert!(circular[0].message.contains("a.adoc -> b.adoc -> a.adoc"));
}

#[test]
fn test_duplicates_warn_but_stay_valid() {
    let dir = docs_tree(&[(
        "guide.adoc",
        "= Guide\n\n== Notes\n\nFirst.\n\n== Notes\n\nSecond.\n",
    )]);
    let index = load(dir.path(), true);
    let report = validate_structure(&index, dir.path(), &FsStore);

    assert!(report.valid);
    assert_eq!(kinds(&report), vec![DiagnosticKind::DuplicatePath]);
    assert_eq!(report.warnings[0].path.as_deref(), Some("guide:notes"));
    assert_eq!(report.warnings[0].line, Some(7));
}

#[test]
fn test_standalone_copy_of_included_file_is_orphaned() {
    let dir = docs_tree(&[
        ("main.adoc", "= Main\n\ninclude::part.adoc[]\n"),
        ("part.adoc", "== Part\n"),
    ]);
    let index = load(dir.path(), false);
    let report = validate_structure(&index, dir.path(), &FsStore);

    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, DiagnosticKind::OrphanedInclude);
    assert_eq!(report.warnings[0].file.as_deref(), Some("part.adoc"));
    assert!(report.warnings[0].message.contains("main.adoc"));
}

#[test]
fn test_report_json_shape() {
    let dir = docs_tree(&[("main.adoc", "= Main\n\ninclude::missing.adoc[]\n")]);
    let index = load(dir.path(), true);
    let report = validate_structure(&index, dir.path(), &FsStore);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["type"], "unresolved_include");
    assert_eq!(json["errors"][0]["severity"], "error");
    assert_eq!(json["errors"][0]["file"], "main.adoc");
    assert_eq!(json["warnings"].as_array().map(Vec::len), Some(0));
}

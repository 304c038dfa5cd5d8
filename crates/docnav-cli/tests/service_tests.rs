//! Integration tests for the tool layer

use std::fs;
use std::sync::Arc;
use std::thread;

use docnav_cli::service::Metadata;
use docnav_cli::{DocsService, Settings};
use docnav_model::ElementType;
use tempfile::TempDir;

const GUIDE: &str = "= Guide

Intro text.

== Install

Run the installer.

[source,rust]
----
fn main() {}
----

== Usage

NOTE: Read this first.

|===
| a | b
|===
";

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

fn open(dir: &TempDir) -> DocsService {
    DocsService::open(dir.path(), Settings::default()).unwrap()
}

#[test]
fn test_negative_parameters_are_rejected() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let service = open(&dir);

    let err = service.get_structure(Some(-1)).unwrap_err();
    assert_eq!(err.code(), "INVALID_PARAMETER");
    assert!(err.to_string().contains("max_depth must be non-negative (got -1)"));

    let err = service.search("install", None, false, Some(-5)).unwrap_err();
    assert!(err.to_string().contains("max_results must be non-negative (got -5)"));

    let err = service.get_elements(None, None, true, Some(-1)).unwrap_err();
    assert!(err.to_string().contains("content_limit"));

    let err = service.search("   ", None, false, None).unwrap_err();
    assert_eq!(err.code(), "INVALID_PARAMETER");
}

#[test]
fn test_unknown_element_type_lists_valid_names() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let service = open(&dir);

    let err = service.get_elements(Some("video"), None, false, None).unwrap_err();
    assert!(err.is_caller_error());
    let message = err.to_string();
    assert!(message.contains("unknown element type 'video'"));
    assert!(message.contains("code"));
    assert!(message.contains("admonition"));
}

#[test]
fn test_elements_filtering_and_truncation() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let service = open(&dir);

    let all = service.get_elements(None, None, false, None).unwrap();
    assert_eq!(all.count, all.elements.len());
    assert!(all.elements.iter().all(|e| e.content.is_none()));

    let code = service
        .get_elements(Some("code"), None, true, Some(4))
        .unwrap();
    assert_eq!(code.count, 1);
    let element = &code.elements[0];
    assert_eq!(element.element_type, ElementType::Code);
    assert_eq!(element.parent_section, "guide:install");
    assert_eq!(element.content.as_deref(), Some("fn m"));
    assert_eq!(element.attributes.get("language").map(String::as_str), Some("rust"));

    let usage = service
        .get_elements(None, Some("guide:usage"), false, None)
        .unwrap();
    assert!(usage.count >= 2);
    assert!(usage
        .elements
        .iter()
        .all(|e| e.parent_section == "guide:usage"));

    let json = serde_json::to_value(&code).unwrap();
    assert_eq!(json["elements"][0]["type"], "code");
}

#[test]
fn test_bogus_position_leaves_file_untouched() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let service = open(&dir);

    let err = service
        .insert_content("guide:install", "middle", "== New\n")
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_POSITION");
    assert!(err.is_caller_error());
    assert_eq!(fs::read_to_string(dir.path().join("guide.adoc")).unwrap(), GUIDE);
}

#[test]
fn test_edit_rebuilds_index() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let service = open(&dir);

    let outcome = service
        .insert_content("guide:usage", "after", "== Troubleshooting\n\nAsk for help.\n")
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.file, "guide.adoc");

    let section = service.get_section("guide:troubleshooting").unwrap();
    assert_eq!(section.title, "Troubleshooting");
    assert!(section.content.contains("Ask for help."));

    let results = service.search("ask for help", None, false, None).unwrap();
    assert_eq!(results.total_results, 1);
    assert_eq!(results.results[0].path, "guide:troubleshooting");
}

#[test]
fn test_without_rebuild_the_snapshot_goes_stale() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let mut settings = Settings::default();
    settings.edit.rebuild_after_edit = false;
    let service = DocsService::open(dir.path(), settings).unwrap();

    service
        .insert_content("guide", "before", "Preface line.\n")
        .unwrap();
    // Headings moved down; the old index no longer matches the file
    let err = service.get_section("guide:usage").unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    service.reload().unwrap();
    assert!(service.get_section("guide:usage").is_ok());
}

#[test]
fn test_hash_guards_update() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let service = open(&dir);

    let before = service.get_section("guide:install").unwrap();
    let outcome = service
        .update_section(
            "guide:install",
            "Use the package manager.\n",
            true,
            Some(&before.content_hash),
        )
        .unwrap();
    assert_eq!(outcome.previous_hash, before.content_hash);

    let err = service
        .update_section("guide:install", "Again.\n", true, Some(&before.content_hash))
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    let after = service.get_section("guide:install").unwrap();
    assert_eq!(after.content_hash, outcome.new_hash);
    assert!(after.content.starts_with("== Install\n"));
    assert!(after.content.contains("Use the package manager."));
}

#[test]
fn test_concurrent_edits_across_files_are_all_applied() {
    let dir = docs_tree(&[
        ("guide.adoc", GUIDE),
        ("notes.md", "# Notes\n\n## Todo\n\nTwo words.\n"),
    ]);
    let service = Arc::new(open(&dir));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                if i % 2 == 0 {
                    service
                        .insert_content("guide:usage", "append", &format!("Note {}.\n", i))
                        .unwrap();
                } else {
                    // Moves the Todo heading down on every edit
                    service
                        .insert_content("notes:todo", "before", &format!("Item {}.\n", i))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let guide = fs::read_to_string(dir.path().join("guide.adoc")).unwrap();
    let notes = fs::read_to_string(dir.path().join("notes.md")).unwrap();
    for i in (0..8).step_by(2) {
        assert!(guide.contains(&format!("Note {}.", i)), "missing note {}", i);
        assert!(notes.contains(&format!("Item {}.", i + 1)), "missing item {}", i + 1);
    }

    // The live snapshot matches both files as they are now
    assert!(service.get_section("guide:usage").is_ok());
    let todo = service.get_section("notes:todo").unwrap();
    assert!(todo.content.starts_with("## Todo"));
    assert_eq!(todo.location.line, notes.lines().position(|l| l == "## Todo").unwrap() + 1);
}

#[test]
fn test_project_and_section_metadata() {
    let dir = docs_tree(&[
        ("guide.adoc", GUIDE),
        ("notes.md", "# Notes\n\n## Todo\n\nTwo words.\n"),
    ]);
    let service = open(&dir);

    match service.get_metadata(None).unwrap() {
        Metadata::Project(project) => {
            assert_eq!(project.documents, 2);
            assert_eq!(project.total_files, 2);
            assert_eq!(project.total_sections, 5);
            assert_eq!(project.formats.get("asciidoc"), Some(&1));
            assert_eq!(project.formats.get("markdown"), Some(&1));
            assert_eq!(
                project.total_words,
                project.files.iter().map(|f| f.words).sum::<usize>()
            );
        }
        other => panic!("expected project metadata, got {:?}", other),
    }

    match service.get_metadata(Some("notes:todo")).unwrap() {
        Metadata::Section(section) => {
            assert_eq!(section.title, "Todo");
            assert_eq!(section.word_count, 4);
            assert_eq!(section.subsections, 0);
            assert_eq!(section.location.file, "notes.md");
        }
        other => panic!("expected section metadata, got {:?}", other),
    }

    let err = service.get_metadata(Some("notes:nope")).unwrap_err();
    assert_eq!(err.code(), "PATH_NOT_FOUND");
}

#[test]
fn test_validate_and_dependencies() {
    let dir = docs_tree(&[
        ("main.adoc", "= Main\n\ninclude::parts/one.adoc[]\n\ninclude::missing.adoc[]\n"),
        ("parts/one.adoc", "== One\n"),
    ]);
    let service = open(&dir);

    let report = service.validate();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("missing.adoc"));

    let deps = service.get_dependencies();
    let targets = deps.include_tree.get("main.adoc").unwrap();
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().any(|t| t.ends_with("one.adoc")));
}

#[test]
fn test_configured_include_depth_is_reported() {
    let dir = docs_tree(&[
        ("a.adoc", "= A\n\ninclude::b.adoc[]\n"),
        ("b.adoc", "== B\n\ninclude::c.adoc[]\n"),
        ("c.adoc", "== C\n\ninclude::d.adoc[]\n"),
        ("d.adoc", "== D\n\ninclude::e.adoc[]\n"),
        ("e.adoc", "== E\n"),
    ]);
    let mut settings = Settings::default();
    settings.workspace.max_include_depth = 2;
    let service = DocsService::open(dir.path(), settings).unwrap();

    let paths: Vec<String> = service
        .snapshot()
        .sections()
        .iter()
        .map(|s| s.path.clone())
        .collect();
    assert_eq!(paths, vec!["a", "a:b", "a:c"]);

    let report = service.validate();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0]
        .message
        .contains("3 levels deep, more than the limit of 2"));
}

#[test]
fn test_non_utf8_document_fails_open() {
    let dir = docs_tree(&[("good.adoc", "= Good\n\n== One\n")]);
    fs::write(dir.path().join("latin1.adoc"), b"= Caf\xe9\n").unwrap();

    let Err(err) = DocsService::open(dir.path(), Settings::default()) else {
        panic!("opening a tree with a non-UTF-8 document should fail");
    };
    assert_eq!(err.code(), "IO_ERROR");
    assert!(err.to_string().contains("latin1.adoc"));
}

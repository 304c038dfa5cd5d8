//! Integration tests for section editing against real files
//!
//! Edits go through `FsStore`; the index is rebuilt after each write, the
//! same way the service does it.

use std::fs;
use std::path::Path;

use docnav_core::{
    load_index, ContentEditor, FsStore, InsertPosition, LoadOptions, NavError, StructureIndex,
};
use tempfile::TempDir;

fn docs_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn load(root: &Path) -> StructureIndex {
    load_index(root, &LoadOptions::for_root(root), &FsStore).unwrap()
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

const GUIDE: &str = "= Guide\n\n== Introduction\n\nOld intro.\n\n== Usage\n\nRun it.\n";

#[test]
fn test_update_keeps_heading_and_rebuild_sees_it() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let index = load(dir.path());

    ContentEditor::new(&index, &FsStore)
        .update_section("guide:introduction", "New body", true, None)
        .unwrap();

    let text = read(&dir, "guide.adoc");
    assert_eq!(
        text,
        "= Guide\n\n== Introduction\n\nNew body\n\n== Usage\n\nRun it.\n"
    );

    let index = load(dir.path());
    let usage = index.get_section("guide:usage").unwrap();
    assert_eq!(usage.source_location.line, 7);
}

#[test]
fn test_hash_chain_across_rebuilds() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let index = load(dir.path());
    let editor = ContentEditor::new(&index, &FsStore);

    let first = editor.read_section("guide:usage").unwrap();
    let outcome = editor
        .update_section("guide:usage", "Run it twice.", true, Some(&first.content_hash))
        .unwrap();

    // The old hash no longer matches
    let err = editor
        .update_section("guide:usage", "Again.", true, Some(&first.content_hash))
        .unwrap_err();
    assert!(matches!(err, NavError::Conflict { .. }));

    let index = load(dir.path());
    let editor = ContentEditor::new(&index, &FsStore);
    let fresh = editor.read_section("guide:usage").unwrap();
    assert_eq!(fresh.content_hash, outcome.new_hash);
    editor
        .update_section("guide:usage", "Third.", true, Some(&outcome.new_hash))
        .unwrap();
    assert!(read(&dir, "guide.adoc").ends_with("== Usage\n\nThird.\n"));
}

#[test]
fn test_insert_before_blank_line_normalization() {
    for content in ["== X\n\nBody", "== X\n\nBody\n", "== X\n\nBody\n\n\n"] {
        let dir = docs_tree(&[("guide.adoc", GUIDE)]);
        let index = load(dir.path());

        ContentEditor::new(&index, &FsStore)
            .insert_content("guide:usage", InsertPosition::Before, content)
            .unwrap();

        let text = read(&dir, "guide.adoc");
        assert!(
            text.contains("Old intro.\n\n== X\n\nBody\n\n== Usage\n"),
            "unexpected layout for {:?}:\n{}",
            content,
            text
        );
    }
}

#[test]
fn test_inserted_heading_becomes_sibling() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let index = load(dir.path());
    ContentEditor::new(&index, &FsStore)
        .insert_content("guide:introduction", InsertPosition::After, "== Setup\n\nSteps.")
        .unwrap();

    let index = load(dir.path());
    let paths: Vec<&str> = index.sections().iter().map(|s| s.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["guide", "guide:introduction", "guide:setup", "guide:usage"]
    );
}

#[test]
fn test_bogus_position_leaves_file_untouched() {
    let dir = docs_tree(&[("guide.adoc", GUIDE)]);
    let err = "bogus".parse::<InsertPosition>().unwrap_err();
    assert_eq!(err.code(), "INVALID_POSITION");
    assert!(err.to_string().contains("bogus"));
    assert_eq!(read(&dir, "guide.adoc"), GUIDE);
}

#[test]
fn test_edit_in_included_file_writes_that_file() {
    let dir = docs_tree(&[
        ("main.adoc", "= Main\n\ninclude::chapter.adoc[]\n"),
        ("chapter.adoc", "== Chapter\n\nDraft.\n"),
    ]);
    let index = load(dir.path());

    let outcome = ContentEditor::new(&index, &FsStore)
        .update_section("main:chapter", "Final.", true, None)
        .unwrap();

    assert_eq!(outcome.file, "chapter.adoc");
    assert_eq!(read(&dir, "chapter.adoc"), "== Chapter\n\nFinal.\n");
    assert_eq!(read(&dir, "main.adoc"), "= Main\n\ninclude::chapter.adoc[]\n");
}

#[test]
fn test_markdown_append_and_stale_detection() {
    let dir = docs_tree(&[("notes.md", "# Notes\n\n## Todo\n\n- one\n")]);
    let index = load(dir.path());
    let editor = ContentEditor::new(&index, &FsStore);

    editor
        .insert_content("notes:todo", InsertPosition::Append, "- two")
        .unwrap();
    assert_eq!(read(&dir, "notes.md"), "# Notes\n\n## Todo\n\n- one\n\n- two\n");

    // Someone else rewrites the file behind the index's back
    fs::write(dir.path().join("notes.md"), "# Notes\n\nNo sections left.\n").unwrap();
    let err = editor.read_section("notes:todo").unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

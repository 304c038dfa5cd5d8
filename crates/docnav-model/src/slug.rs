//! Slugs and section paths
//!
//! Section paths are built from the owning file's prefix followed by the
//! slugs of the section titles on the way down:
//!
//! ```text
//! guide.adoc        = User Guide        -> guide
//!                   == Installation     -> guide:installation
//!                   === On Linux        -> guide:installation.on-linux
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions stripped when deriving a file prefix
pub const KNOWN_DOC_EXTENSIONS: [&str; 3] = ["md", "adoc", "asciidoc"];

/// Convert text to a lowercase, path-safe slug.
///
/// Characters other than letters, digits, whitespace, `_` and `-` are
/// dropped; runs of whitespace, `_` and `-` become a single `-`; leading
/// and trailing dashes are trimmed. Unicode letters are kept, so
/// `Übersicht` becomes `übersicht`. The function is total and idempotent.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c == '-' || c == '_' || c.is_whitespace() {
            pending_dash = true;
        }
    }

    slug
}

/// Remove a known documentation extension from a path.
///
/// Only `.md`, `.adoc` and `.asciidoc` are stripped, so dots that belong to
/// the file name survive: `report_v1.2.3.md` becomes `report_v1.2.3`, while
/// `notes.txt` is returned unchanged. Backslashes are normalised to `/`.
pub fn strip_doc_extension(path: &Path) -> String {
    let path_str = path.to_string_lossy().replace('\\', "/");

    let ext = match path.extension() {
        Some(ext) => ext.to_string_lossy(),
        None => return path_str,
    };

    if !KNOWN_DOC_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
        return path_str;
    }

    match path_str.strip_suffix(&format!(".{}", ext)) {
        Some(stripped) => stripped.to_string(),
        None => path_str,
    }
}

/// Path prefix contributed by a source file.
///
/// With a docs root this is the file's path relative to the root; without
/// one it is just the file name. The known extension is stripped either way.
pub fn file_prefix(file: &Path, root: Option<&Path>) -> String {
    let relative = match root {
        Some(root) => file.strip_prefix(root).unwrap_or(file),
        None => file.file_name().map(Path::new).unwrap_or(file),
    };
    strip_doc_extension(relative)
}

/// Separators used when joining slugs into section paths
///
/// The same style must be used for a whole index build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    /// Between the file prefix and the first section slug
    pub document_separator: String,
    /// Between nested section slugs
    pub section_separator: String,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            document_separator: ":".to_string(),
            section_separator: ".".to_string(),
        }
    }
}

impl PathStyle {
    /// Path of a top-level heading directly below the document
    pub fn document_child(&self, prefix: &str, slug: &str) -> String {
        format!("{}{}{}", prefix, self.document_separator, slug)
    }

    /// Path of a heading nested in another heading
    pub fn section_child(&self, parent: &str, slug: &str) -> String {
        format!("{}{}{}", parent, self.section_separator, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basics() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("hello_world"), "hello-world");
        assert_eq!(slugify("  Leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("A -- B"), "a-b");
        assert_eq!(slugify("What's new?"), "whats-new");
        assert_eq!(slugify("Übersicht"), "übersicht");
        assert_eq!(slugify("v1.2.3 Release"), "v123-release");
    }

    #[test]
    fn test_slugify_empty_and_symbols() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_strip_doc_extension() {
        assert_eq!(
            strip_doc_extension(Path::new("report_v1.2.3.md")),
            "report_v1.2.3"
        );
        assert_eq!(strip_doc_extension(Path::new("notes.txt")), "notes.txt");
        assert_eq!(strip_doc_extension(Path::new("guide.ADOC")), "guide");
        assert_eq!(
            strip_doc_extension(Path::new("docs/arc42.asciidoc")),
            "docs/arc42"
        );
        assert_eq!(strip_doc_extension(Path::new("README")), "README");
    }

    #[test]
    fn test_file_prefix_with_and_without_root() {
        let root = Path::new("/docs");
        assert_eq!(
            file_prefix(Path::new("/docs/reports/sprint_2.0.1.md"), Some(root)),
            "reports/sprint_2.0.1"
        );
        assert_eq!(
            file_prefix(Path::new("/tmp/x/report_v2.1.5.md"), None),
            "report_v2.1.5"
        );
        // Files outside the root keep their full path
        assert_eq!(
            file_prefix(Path::new("/elsewhere/a.adoc"), Some(root)),
            "/elsewhere/a"
        );
    }

    #[test]
    fn test_path_style() {
        let style = PathStyle::default();
        let chapter = style.document_child("guide", "installation");
        assert_eq!(chapter, "guide:installation");
        assert_eq!(
            style.section_child(&chapter, "on-linux"),
            "guide:installation.on-linux"
        );

        let dotted = PathStyle {
            document_separator: ".".to_string(),
            section_separator: ".".to_string(),
        };
        assert_eq!(dotted.document_child("guide", "intro"), "guide.intro");
    }
}

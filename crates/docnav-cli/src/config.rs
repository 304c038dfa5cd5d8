//! Configuration settings
//!
//! Settings are loaded from `docnav.toml` (or `.docnav.toml`):
//!
//! ```toml
//! [workspace]
//! root = "docs/"
//! extensions = ["adoc", "md"]
//! skip_included_files = true
//! max_include_depth = 20
//!
//! [paths]
//! document_separator = ":"
//! section_separator = "."
//!
//! [search]
//! max_results = 50
//! snippet_width = 160
//!
//! [edit]
//! rebuild_after_edit = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docnav_core::loader::DEFAULT_EXTENSIONS;
use docnav_core::parser::{ParserConfig, DEFAULT_MAX_INCLUDE_DEPTH};
use docnav_core::search::DEFAULT_SNIPPET_WIDTH;
use docnav_core::LoadOptions;
use docnav_model::PathStyle;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File names looked up when no `--config` is given
pub const CONFIG_FILE_NAMES: [&str; 2] = ["docnav.toml", ".docnav.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub workspace: WorkspaceSettings,
    /// Section path separators
    pub paths: PathStyle,
    pub search: SearchSettings,
    pub edit: EditSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Loader options for a docs root
    pub fn load_options(&self, root: &Path) -> LoadOptions {
        LoadOptions {
            extensions: self.workspace.extensions.clone(),
            skip_included_files: self.workspace.skip_included_files,
            parser: ParserConfig {
                root: Some(root.to_path_buf()),
                path_style: self.paths.clone(),
                max_include_depth: self.workspace.max_include_depth,
            },
        }
    }
}

/// Which files make up the documentation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Documentation root; `--docs-root` wins over this
    pub root: Option<PathBuf>,
    /// Extensions to index, without the dot
    pub extensions: Vec<String>,
    /// Index included files only through the documents that include them
    pub skip_included_files: bool,
    pub max_include_depth: usize,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            skip_included_files: true,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

/// Search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Used when the caller gives no `max_results`
    pub max_results: usize,
    pub snippet_width: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 50,
            snippet_width: DEFAULT_SNIPPET_WIDTH,
        }
    }
}

/// Edit behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSettings {
    /// Rebuild the index after every successful edit
    pub rebuild_after_edit: bool,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            rebuild_after_edit: true,
        }
    }
}

/// Load settings from an explicit file, or from the first config file
/// found in `search_dirs`. Falls back to defaults.
pub fn load_settings(config_path: Option<&Path>, search_dirs: &[&Path]) -> Result<Settings> {
    if let Some(path) = config_path {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        return Settings::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()));
    }

    for dir in search_dirs {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if !candidate.is_file() {
                continue;
            }
            let content = fs::read_to_string(&candidate)
                .with_context(|| format!("Failed to read config: {}", candidate.display()))?;
            match Settings::from_toml_str(&content) {
                Ok(settings) => {
                    debug!(config = %candidate.display(), "Loaded settings");
                    return Ok(settings);
                }
                Err(e) => {
                    warn!(config = %candidate.display(), error = %e, "Ignoring invalid config")
                }
            }
        }
    }
    Ok(Settings::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.workspace.extensions, vec!["adoc", "asciidoc", "md"]);
        assert!(settings.workspace.skip_included_files);
        assert_eq!(settings.workspace.max_include_depth, 20);
        assert_eq!(settings.paths.document_separator, ":");
        assert_eq!(settings.search.max_results, 50);
        assert!(settings.edit.rebuild_after_edit);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
[workspace]
root = "docs"

[paths]
section_separator = "/"

[search]
max_results = 10
"#;
        let settings = Settings::from_toml_str(toml).unwrap();
        assert_eq!(settings.workspace.root, Some(PathBuf::from("docs")));
        assert_eq!(settings.workspace.max_include_depth, 20);
        assert_eq!(settings.paths.document_separator, ":");
        assert_eq!(settings.paths.section_separator, "/");
        assert_eq!(settings.search.max_results, 10);
        assert_eq!(settings.search.snippet_width, 160);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Settings::from_toml_str("[search]\nmax_results = \"many\"\n").is_err());
    }

    #[test]
    fn test_load_options() {
        let mut settings = Settings::default();
        settings.workspace.skip_included_files = false;
        settings.workspace.max_include_depth = 5;
        let options = settings.load_options(Path::new("/docs"));
        assert!(!options.skip_included_files);
        assert_eq!(options.parser.max_include_depth, 5);
        assert_eq!(options.parser.root.as_deref(), Some(Path::new("/docs")));
    }

    #[test]
    fn test_load_settings_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".docnav.toml"), "[edit]\nrebuild_after_edit = false\n").unwrap();

        let settings = load_settings(None, &[empty.path(), dir.path()]).unwrap();
        assert!(!settings.edit.rebuild_after_edit);

        let settings = load_settings(None, &[empty.path()]).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_settings(Some(&missing), &[]).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}

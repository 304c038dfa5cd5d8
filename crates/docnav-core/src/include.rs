//! Include directive parsing and resolution.
//!
//! # Syntax
//!
//! ```text
//! include::chapters/intro.adoc[]
//! include::{partsdir}/setup.adoc[leveloffset=+1]
//! include::snippets.adoc[tag=install,lines=1..10]
//! ```
//!
//! The target is resolved against the directory of the file that contains
//! the directive. `{name}` references in the target are replaced with
//! document attributes that are already defined.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Parsed include directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Target as written, before attribute substitution
    pub target: String,
    /// Bracketed options (`leveloffset`, `tag`, `lines`, ...)
    pub options: BTreeMap<String, String>,
}

/// A `leveloffset` option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOffset {
    /// `leveloffset=+1` / `leveloffset=-1`
    Relative(i32),
    /// `leveloffset=2`
    Absolute(i32),
}

impl LevelOffset {
    /// Apply to the offset currently in effect
    pub fn apply(self, current: i32) -> i32 {
        match self {
            LevelOffset::Relative(delta) => current + delta,
            LevelOffset::Absolute(value) => value,
        }
    }
}

impl IncludeDirective {
    /// Parse an include directive from a line
    ///
    /// # Format
    /// `include::path[attributes]`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix("include::")?;

        // Find brackets
        let bracket_start = rest.find('[')?;
        let bracket_end = rest.rfind(']')?;

        if bracket_start >= bracket_end || bracket_end != rest.len() - 1 {
            return None;
        }

        let target = rest[..bracket_start].trim().to_string();
        if target.is_empty() {
            return None;
        }

        let mut options = BTreeMap::new();
        for attr in rest[bracket_start + 1..bracket_end].split(',') {
            let attr = attr.trim();

            if attr.is_empty() {
                continue;
            }

            match attr.find('=') {
                Some(eq_pos) => {
                    let key = attr[..eq_pos].trim().to_lowercase();
                    let value = attr[eq_pos + 1..].trim().trim_matches('"').to_string();
                    options.insert(key, value);
                }
                None => {
                    options.insert(attr.to_lowercase(), String::new());
                }
            }
        }

        Some(Self { target, options })
    }

    /// The `leveloffset` option, if present and well-formed
    pub fn level_offset(&self) -> Option<LevelOffset> {
        let raw = self.options.get("leveloffset")?.trim();
        if let Some(delta) = raw.strip_prefix('+') {
            delta.parse().ok().map(LevelOffset::Relative)
        } else if raw.starts_with('-') {
            raw.parse().ok().map(LevelOffset::Relative)
        } else {
            raw.parse().ok().map(LevelOffset::Absolute)
        }
    }

    /// Target with `{attribute}` references substituted
    pub fn expand_target(&self, attributes: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(self.target.len());
        let mut rest = self.target.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let name = &after[..close];
                    match attributes.get(name) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Resolve the target against the including file
    pub fn resolve(&self, including_file: &Path, attributes: &BTreeMap<String, String>) -> PathBuf {
        let target = self.expand_target(attributes);
        let target = Path::new(&target);
        if target.is_absolute() {
            return normalize_path(target);
        }
        let base = including_file.parent().unwrap_or_else(|| Path::new(""));
        normalize_path(&base.join(target))
    }
}

/// Lexically remove `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

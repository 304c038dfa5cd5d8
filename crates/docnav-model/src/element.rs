//! Non-section structural elements
//!
//! Code blocks, tables, images, PlantUML diagrams, admonitions and lists.
//! Each element remembers the path of the section it appears in.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::section::SourceLocation;

/// Kind of a structural element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Source/listing block
    Code,
    /// Table
    Table,
    /// Block image
    Image,
    /// PlantUML diagram block
    Plantuml,
    /// NOTE/TIP/WARNING/... block
    Admonition,
    /// Ordered or unordered list
    List,
}

impl ElementType {
    /// Every element type, in display order
    pub const ALL: [ElementType; 6] = [
        ElementType::Code,
        ElementType::Table,
        ElementType::Image,
        ElementType::Plantuml,
        ElementType::Admonition,
        ElementType::List,
    ];

    /// Lowercase name used in filters and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Code => "code",
            ElementType::Table => "table",
            ElementType::Image => "image",
            ElementType::Plantuml => "plantuml",
            ElementType::Admonition => "admonition",
            ElementType::List => "list",
        }
    }

    /// Comma-separated list of valid names, for error messages
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural item that is not a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element kind
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Path of the enclosing section
    pub parent_section: String,
    /// Location of the element's first line
    pub source_location: SourceLocation,
    /// Raw content (block body, image target, list text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Block attributes (`language`, `alt`, `kind`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    /// Create an element without content
    pub fn new(
        element_type: ElementType,
        parent_section: impl Into<String>,
        source_location: SourceLocation,
    ) -> Self {
        Self {
            element_type,
            parent_section: parent_section.into(),
            source_location,
            content: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the raw content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

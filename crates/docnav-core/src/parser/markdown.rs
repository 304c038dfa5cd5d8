//! Markdown structure parser
//!
//! ATX headings (`#` through `######`) define sections; fenced code blocks
//! and multi-line HTML comments are opaque. Markdown has no include
//! mechanism, so attributes, cross references and includes stay empty.

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use docnav_model::{Document, DocumentFormat, Element, ElementType, SourceLocation};
use regex::Regex;
use tracing::debug;

use super::tree::{FileHeadings, SectionTree};
use super::{ParserConfig, StructureParser};
use crate::scanner::{BlockKind, HeadingLine, LineKind, LineScanner};

fn heading_anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s*\{#([\w:.-]+)\}$").unwrap())
}

/// `Title {#id}` into the title and the id
pub(super) fn split_heading_anchor(title: &str) -> (String, Option<String>) {
    match heading_anchor_re().captures(title) {
        Some(caps) => (caps[1].to_string(), Some(caps[2].to_string())),
        None => (title.to_string(), None),
    }
}

fn image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^!\[([^\]]*)\]\(([^)\s]+)(?:\s+"[^"]*")?\)$"#).unwrap())
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*([-*+]|\d+[.)])[ \t]+\S").unwrap())
}

fn alert_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^>\s*\[!(NOTE|TIP|IMPORTANT|WARNING|CAUTION)\]\s*$").unwrap()
    })
}

/// Parser for `.md` files
pub struct MarkdownParser<'a> {
    config: &'a ParserConfig,
}

impl<'a> MarkdownParser<'a> {
    /// Create a parser
    pub fn new(config: &'a ParserConfig) -> Self {
        Self { config }
    }
}

/// The element currently accumulating lines
enum Open {
    None,
    Fence(Option<Element>, Vec<String>),
    Table(usize),
    List(usize),
    Alert(usize),
}

impl StructureParser for MarkdownParser<'_> {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Markdown
    }

    fn parse_str(&self, file: &Path, text: &str) -> Document {
        let mut tree = SectionTree::new(
            self.config.prefix_for(file),
            self.config.path_style.clone(),
        );
        let mut document = Document::new(file, DocumentFormat::Markdown);
        let mut scanner = LineScanner::new(DocumentFormat::Markdown);
        let mut headings = Vec::new();
        let mut total_lines = 0;
        let mut open = Open::None;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            total_lines = line_no;
            let location = || SourceLocation::new(file, line_no);

            match scanner.scan(line) {
                LineKind::Heading { level, title } => {
                    let (text, anchor) = split_heading_anchor(&title);
                    headings.push(HeadingLine {
                        line: line_no,
                        level,
                        title,
                    });
                    open = Open::None;

                    tree.open(&text, level, location(), anchor);
                }
                LineKind::BlockOpen { kind, info } => {
                    let element = (kind == BlockKind::Fence).then(|| {
                        let language = info.split_whitespace().next().unwrap_or("");
                        let parent = tree.current_path();
                        match language {
                            "plantuml" | "puml" => {
                                Element::new(ElementType::Plantuml, parent, location())
                            }
                            "" => Element::new(ElementType::Code, parent, location()),
                            lang => Element::new(ElementType::Code, parent, location())
                                .with_attribute("language", lang),
                        }
                    });
                    open = Open::Fence(element, Vec::new());
                }
                LineKind::BlockBody => {
                    if let Open::Fence(Some(_), body) = &mut open {
                        body.push(line.to_string());
                    }
                }
                LineKind::BlockClose { .. } => {
                    if let Open::Fence(Some(mut element), body) =
                        std::mem::replace(&mut open, Open::None)
                    {
                        element.content = Some(body.join("\n"));
                        document.elements.push(element);
                    }
                }
                LineKind::Text => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        open = Open::None;
                        continue;
                    }

                    // Continuation of a table, list or alert
                    let continues = match &open {
                        Open::Table(idx) if trimmed.starts_with('|') => Some(*idx),
                        Open::List(idx)
                            if list_item_re().is_match(line)
                                || line.starts_with(|c: char| c == ' ' || c == '\t') =>
                        {
                            Some(*idx)
                        }
                        Open::Alert(idx) if trimmed.starts_with('>') => Some(*idx),
                        _ => None,
                    };
                    if let Some(idx) = continues {
                        if let Some(element) = document.elements.get_mut(idx) {
                            let content = element.content.get_or_insert_with(String::new);
                            if !content.is_empty() {
                                content.push('\n');
                            }
                            content.push_str(trimmed.trim_start_matches('>').trim());
                        }
                        continue;
                    }

                    let parent = tree.current_path().to_string();
                    if trimmed.starts_with('|') {
                        document.elements.push(
                            Element::new(ElementType::Table, parent, location())
                                .with_content(trimmed),
                        );
                        open = Open::Table(document.elements.len() - 1);
                    } else if let Some(caps) = alert_re().captures(trimmed) {
                        document.elements.push(
                            Element::new(ElementType::Admonition, parent, location())
                                .with_attribute("kind", &caps[1])
                                .with_content(""),
                        );
                        open = Open::Alert(document.elements.len() - 1);
                    } else if let Some(caps) = image_re().captures(trimmed) {
                        let mut element = Element::new(ElementType::Image, parent, location())
                            .with_content(&caps[2]);
                        if !caps[1].is_empty() {
                            element = element.with_attribute("alt", &caps[1]);
                        }
                        document.elements.push(element);
                        open = Open::None;
                    } else if let Some(caps) = list_item_re().captures(line) {
                        let style = if caps[1].starts_with(|c: char| c.is_ascii_digit()) {
                            "ordered"
                        } else {
                            "unordered"
                        };
                        document.elements.push(
                            Element::new(ElementType::List, parent, location())
                                .with_attribute("style", style)
                                .with_content(trimmed),
                        );
                        open = Open::List(document.elements.len() - 1);
                    } else {
                        open = Open::None;
                    }
                }
            }
        }

        if let Open::Fence(Some(mut element), body) = open {
            element.content = Some(body.join("\n"));
            document.elements.push(element);
        }

        let mut files = HashMap::new();
        files.insert(
            file.to_path_buf(),
            FileHeadings {
                headings,
                total_lines,
            },
        );

        document.title = tree.title().unwrap_or_default().to_string();
        document.sections = tree.finish(&files);

        debug!(
            file = %file.display(),
            sections = document.all_sections().count(),
            "Parsed Markdown document"
        );
        document
    }
}

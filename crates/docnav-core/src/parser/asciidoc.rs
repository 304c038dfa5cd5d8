//! AsciiDoc structure parser
//!
//! Recognises `=`-style headings, delimited blocks, block attributes and
//! anchors, attribute entries, cross references and `include::`
//! directives. Includes are expanded in place: the included file's
//! headings join the including document's tree at the directive's position
//! (shifted by `leveloffset`), while their source locations keep pointing
//! at the included file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use docnav_model::{
    CrossReference, Document, DocumentFormat, Element, ElementType, IncludeInfo, SourceLocation,
};
use regex::Regex;
use tracing::{debug, warn};

use super::tree::{FileHeadings, SectionTree};
use super::{ParserConfig, StructureParser};
use crate::include::{normalize_path, IncludeDirective};
use crate::scanner::{BlockKind, HeadingLine, LineKind, LineScanner};
use crate::store::FileStore;

const ADMONITIONS: [&str; 5] = ["NOTE", "TIP", "IMPORTANT", "WARNING", "CAUTION"];

fn attribute_entry_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^:(!)?([A-Za-z0-9_][\w-]*)(!)?:(?:[ \t]+(.*))?$").unwrap())
}

fn block_anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\[\[([A-Za-z_:][\w:.-]*)(?:,[^\]]*)?\]\]|\[#([A-Za-z_:][\w:-]*)[^\]]*\])$")
            .unwrap()
    })
}

fn block_attribute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[([^\[\]]*)\]$").unwrap())
}

fn inline_anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\[\[([^\]]+)\]\]\s*(.+)|(.+?)\s*\[\[([^\]]+)\]\])$").unwrap()
    })
}

fn xref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<<([^<>,]+?)(?:,\s*([^<>]+?))?>>|xref:([^\[\s]+)\[([^\]]*)\]").unwrap()
    })
}

fn block_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^image::([^\[\s]+)\[(.*)\]$").unwrap())
}

fn admonition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(NOTE|TIP|IMPORTANT|WARNING|CAUTION):[ \t]+(.+)$").unwrap())
}

fn list_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*(\*{1,5}|-|\.{1,5}|\d+\.)[ \t]+\S").unwrap())
}

/// Parser for `.adoc` / `.asciidoc` files
pub struct AsciidocParser<'a> {
    config: &'a ParserConfig,
    store: &'a dyn FileStore,
}

struct ParseState {
    tree: SectionTree,
    document: Document,
    files: HashMap<PathBuf, FileHeadings>,
    include_stack: Vec<PathBuf>,
}

/// The file currently being read and how it was reached
#[derive(Clone, Copy)]
struct FileFrame<'f> {
    file: &'f Path,
    resolved_from: Option<&'f SourceLocation>,
    level_offset: i32,
    depth: usize,
}

impl FileFrame<'_> {
    fn location(&self, line: usize) -> SourceLocation {
        let location = SourceLocation::new(self.file, line);
        match self.resolved_from {
            Some(directive) => location.with_resolved_from(directive.clone()),
            None => location,
        }
    }
}

struct OpenBlock {
    element: Option<Element>,
    body: Vec<String>,
}

impl<'a> AsciidocParser<'a> {
    /// Create a parser that reads included files from `store`
    pub fn new(config: &'a ParserConfig, store: &'a dyn FileStore) -> Self {
        Self { config, store }
    }

    fn parse_lines(&self, state: &mut ParseState, frame: FileFrame<'_>, text: &str) {
        let mut scanner = LineScanner::new(DocumentFormat::AsciiDoc);
        let mut headings = Vec::new();
        let mut total_lines = 0;
        let mut block: Option<OpenBlock> = None;
        let mut block_attrs: Option<String> = None;
        let mut anchor: Option<String> = None;
        let mut list: Option<usize> = None;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            total_lines = line_no;

            match scanner.scan(line) {
                LineKind::Heading { level, title } => {
                    headings.push(HeadingLine {
                        line: line_no,
                        level,
                        title: title.clone(),
                    });
                    list = None;
                    block_attrs = None;

                    let (title, inline_anchor) = split_inline_anchor(&title);
                    let effective = (i32::from(level) + frame.level_offset).clamp(0, 6) as u8;
                    state.tree.open(
                        &title,
                        effective,
                        frame.location(line_no),
                        anchor.take().or(inline_anchor),
                    );
                }
                LineKind::BlockOpen { kind, .. } => {
                    list = None;
                    anchor = None;
                    let attrs = block_attrs.take();
                    let element = block_element(kind, attrs.as_deref()).map(|element| Element {
                        parent_section: state.tree.current_path().to_string(),
                        source_location: frame.location(line_no),
                        ..element
                    });
                    block = Some(OpenBlock {
                        element,
                        body: Vec::new(),
                    });
                }
                LineKind::BlockBody => {
                    if let Some(open) = block.as_mut().filter(|b| b.element.is_some()) {
                        open.body.push(line.to_string());
                    }
                }
                LineKind::BlockClose { .. } => {
                    if let Some(open) = block.take() {
                        finish_block(&mut state.document, open);
                    }
                }
                LineKind::Text => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        block_attrs = None;
                        list = None;
                        continue;
                    }

                    if let Some(directive) = IncludeDirective::parse(trimmed) {
                        list = None;
                        self.expand_include(state, frame, line_no, &directive);
                        continue;
                    }

                    if let Some(caps) = block_anchor_re().captures(trimmed) {
                        anchor = caps
                            .get(1)
                            .or_else(|| caps.get(2))
                            .map(|m| m.as_str().to_string());
                        continue;
                    }

                    if let Some(caps) = attribute_entry_re().captures(trimmed) {
                        let name = caps[2].to_string();
                        if caps.get(1).is_some() || caps.get(3).is_some() {
                            state.document.attributes.remove(&name);
                        } else {
                            let value = caps.get(4).map_or("", |m| m.as_str().trim());
                            state.document.attributes.insert(name, value.to_string());
                        }
                        continue;
                    }

                    if let Some(caps) = block_attribute_re().captures(trimmed) {
                        block_attrs = Some(caps[1].to_string());
                        continue;
                    }

                    collect_xrefs(&mut state.document, frame, line_no, line);
                    let parent = state.tree.current_path().to_string();

                    if let Some(caps) = block_image_re().captures(trimmed) {
                        let mut element =
                            Element::new(ElementType::Image, parent, frame.location(line_no))
                                .with_content(&caps[1]);
                        if let Some(alt) = first_positional(&caps[2]) {
                            element = element.with_attribute("alt", alt);
                        }
                        state.document.elements.push(element);
                        list = None;
                    } else if let Some(caps) = admonition_re().captures(trimmed) {
                        state.document.elements.push(
                            Element::new(ElementType::Admonition, parent, frame.location(line_no))
                                .with_attribute("kind", &caps[1])
                                .with_content(&caps[2]),
                        );
                        list = None;
                    } else if let Some(caps) = list_item_re().captures(line) {
                        match list.and_then(|i| state.document.elements.get_mut(i)) {
                            Some(existing) => {
                                let content = existing.content.get_or_insert_with(String::new);
                                content.push('\n');
                                content.push_str(trimmed);
                            }
                            None => {
                                let marker = &caps[1];
                                let style = if marker.starts_with('.')
                                    || marker.starts_with(|c: char| c.is_ascii_digit())
                                {
                                    "ordered"
                                } else {
                                    "unordered"
                                };
                                state.document.elements.push(
                                    Element::new(ElementType::List, parent, frame.location(line_no))
                                        .with_attribute("style", style)
                                        .with_content(trimmed),
                                );
                                list = Some(state.document.elements.len() - 1);
                            }
                        }
                    }

                    block_attrs = None;
                    anchor = None;
                }
            }
        }

        // Unterminated block runs to the end of the file
        if let Some(open) = block.take() {
            finish_block(&mut state.document, open);
        }

        state.files.insert(
            frame.file.to_path_buf(),
            FileHeadings {
                headings,
                total_lines,
            },
        );
    }

    fn expand_include(
        &self,
        state: &mut ParseState,
        frame: FileFrame<'_>,
        line_no: usize,
        directive: &IncludeDirective,
    ) {
        let location = frame.location(line_no);
        let target = directive.resolve(frame.file, &state.document.attributes);

        let mut info = IncludeInfo::new(location.clone(), target.clone());
        info.options = directive.options.clone();
        state.document.includes.push(info);

        if frame.depth >= self.config.max_include_depth {
            warn!(
                include = %target.display(),
                depth = frame.depth + 1,
                max = self.config.max_include_depth,
                "Include depth limit reached, not expanding"
            );
            return;
        }

        if state.include_stack.contains(&target) {
            debug!(include = %target.display(), "Circular include, not expanding");
            return;
        }

        let text = match self.store.read_file(&target) {
            Ok(text) => text,
            Err(err) => {
                debug!(include = %target.display(), error = %err, "Include target not readable");
                return;
            }
        };

        let level_offset = directive
            .level_offset()
            .map_or(frame.level_offset, |offset| offset.apply(frame.level_offset));

        state.include_stack.push(target.clone());
        let child = FileFrame {
            file: &target,
            resolved_from: Some(&location),
            level_offset,
            depth: frame.depth + 1,
        };
        self.parse_lines(state, child, &text);
        state.include_stack.pop();
    }
}

impl StructureParser for AsciidocParser<'_> {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::AsciiDoc
    }

    fn parse_str(&self, file: &Path, text: &str) -> Document {
        let mut state = ParseState {
            tree: SectionTree::new(
                self.config.prefix_for(file),
                self.config.path_style.clone(),
            ),
            document: Document::new(file, DocumentFormat::AsciiDoc),
            files: HashMap::new(),
            include_stack: vec![normalize_path(file)],
        };

        let frame = FileFrame {
            file,
            resolved_from: None,
            level_offset: 0,
            depth: 0,
        };
        self.parse_lines(&mut state, frame, text);

        let ParseState {
            tree,
            mut document,
            files,
            ..
        } = state;
        document.title = tree.title().unwrap_or_default().to_string();
        document.sections = tree.finish(&files);

        debug!(
            file = %file.display(),
            sections = document.all_sections().count(),
            includes = document.includes.len(),
            "Parsed AsciiDoc document"
        );
        document
    }
}

/// Element for a delimited block, given its kind and attribute list
fn block_element(kind: BlockKind, attrs: Option<&str>) -> Option<Element> {
    let positional: Vec<&str> = attrs
        .map(|a| a.split(',').map(str::trim).collect())
        .unwrap_or_default();
    let style = positional.first().map_or("", |s| style_name(s));
    let blank = |t| Element::new(t, "", SourceLocation::new("", 0));

    match kind {
        BlockKind::Listing | BlockKind::Literal if style == "plantuml" || style == "puml" => {
            Some(blank(ElementType::Plantuml))
        }
        BlockKind::Listing => {
            let element = blank(ElementType::Code);
            match positional.get(1).filter(|l| style == "source" && !l.is_empty()) {
                Some(language) => Some(element.with_attribute("language", *language)),
                None => Some(element),
            }
        }
        BlockKind::Literal => Some(blank(ElementType::Code).with_attribute("style", "literal")),
        BlockKind::Table => Some(blank(ElementType::Table)),
        BlockKind::Example | BlockKind::Open | BlockKind::Sidebar | BlockKind::Quote
            if ADMONITIONS.contains(&style) =>
        {
            Some(blank(ElementType::Admonition).with_attribute("kind", style))
        }
        _ => None,
    }
}

fn finish_block(document: &mut Document, open: OpenBlock) {
    if let Some(mut element) = open.element {
        element.content = Some(open.body.join("\n"));
        document.elements.push(element);
    }
}

/// `source#id.role` -> `source`
fn style_name(positional: &str) -> &str {
    let end = positional
        .find(|c| matches!(c, '#' | '.' | '%'))
        .unwrap_or(positional.len());
    &positional[..end]
}

fn first_positional(attrs: &str) -> Option<&str> {
    attrs
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.contains('='))
}

/// `[[id]]`, `[#id]` or `[attrs]` on a line of its own
pub(super) fn is_block_metadata(line: &str) -> bool {
    let trimmed = line.trim();
    block_anchor_re().is_match(trimmed) || block_attribute_re().is_match(trimmed)
}

/// `[[id]]Title` or `Title [[id]]` -> (`Title`, `id`)
pub(super) fn split_inline_anchor(title: &str) -> (String, Option<String>) {
    match inline_anchor_re().captures(title) {
        Some(caps) => {
            let (text, id) = match caps.get(1) {
                Some(id) => (caps.get(2), id),
                None => match caps.get(4) {
                    Some(id) => (caps.get(3), id),
                    None => return (title.to_string(), None),
                },
            };
            let text = text.map_or(title, |m| m.as_str()).trim().to_string();
            (text, Some(id.as_str().to_string()))
        }
        None => (title.to_string(), None),
    }
}

fn collect_xrefs(document: &mut Document, frame: FileFrame<'_>, line_no: usize, line: &str) {
    for caps in xref_re().captures_iter(line) {
        let (target, label) = match caps.get(1) {
            Some(target) => (target, caps.get(2)),
            None => match caps.get(3) {
                Some(target) => (target, caps.get(4)),
                None => continue,
            },
        };
        document.cross_references.push(CrossReference {
            target: target.as_str().trim().to_string(),
            label: label
                .map(|m| m.as_str().trim().to_string())
                .filter(|l| !l.is_empty()),
            source_location: frame.location(line_no),
        });
    }
}

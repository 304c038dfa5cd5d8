//! Section tree assembly
//!
//! Headings arrive in document order (with included files already
//! expanded in place). Each heading closes every open section of the same
//! or a deeper level, becomes a child of whatever is left on the stack and
//! gets its path from that parent.

use std::collections::HashMap;
use std::path::PathBuf;

use docnav_model::{slugify, PathStyle, Section, SourceLocation};

use crate::scanner::{span_end, HeadingLine};

/// Headings of one physical file, for computing section end lines
#[derive(Debug, Clone, Default)]
pub(crate) struct FileHeadings {
    pub headings: Vec<HeadingLine>,
    pub total_lines: usize,
}

struct Node {
    section: Section,
    children: Vec<usize>,
}

pub(crate) struct SectionTree {
    prefix: String,
    style: PathStyle,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    stack: Vec<usize>,
    title_node: Option<usize>,
}

impl SectionTree {
    pub fn new(prefix: impl Into<String>, style: PathStyle) -> Self {
        Self {
            prefix: prefix.into(),
            style,
            nodes: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
            title_node: None,
        }
    }

    /// Open a section for a heading at an effective `level`
    pub fn open(
        &mut self,
        title: &str,
        level: u8,
        location: SourceLocation,
        anchor: Option<String>,
    ) -> &str {
        while let Some(&top) = self.stack.last() {
            if self.nodes[top].section.level >= level {
                self.stack.pop();
            } else {
                break;
            }
        }

        let slug = slugify(title);
        let parent = self.stack.last().copied();
        let is_title = parent.is_none() && level == 0 && self.nodes.is_empty();

        let path = match parent {
            Some(p) if Some(p) == self.title_node => {
                self.style.document_child(&self.nodes[p].section.path, &slug)
            }
            Some(p) => self.style.section_child(&self.nodes[p].section.path, &slug),
            None if is_title => self.prefix.clone(),
            None => self.style.document_child(&self.prefix, &slug),
        };

        let mut section = Section::new(title, level, path, location);
        section.anchor = anchor;

        let idx = self.nodes.len();
        self.nodes.push(Node {
            section,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
        if is_title {
            self.title_node = Some(idx);
        }
        self.stack.push(idx);

        &self.nodes[idx].section.path
    }

    /// Path of the innermost open section, or the file prefix
    pub fn current_path(&self) -> &str {
        match self.stack.last() {
            Some(&top) => &self.nodes[top].section.path,
            None => &self.prefix,
        }
    }

    /// Document title, if the first heading was a level-0 heading
    pub fn title(&self) -> Option<&str> {
        self.title_node
            .map(|idx| self.nodes[idx].section.title.as_str())
    }

    /// Fill in end lines and assemble the nested sections
    pub fn finish(self, files: &HashMap<PathBuf, FileHeadings>) -> Vec<Section> {
        let mut sections: Vec<Option<Section>> = Vec::with_capacity(self.nodes.len());
        let mut child_lists = Vec::with_capacity(self.nodes.len());

        for node in self.nodes {
            let mut section = node.section;
            let location = &section.source_location;
            if let Some(file) = files.get(&location.file) {
                if let Some(end) = span_end(&file.headings, location.line, file.total_lines) {
                    section.source_location.end_line = Some(end);
                }
            }
            sections.push(Some(section));
            child_lists.push(node.children);
        }

        // Children always come after their parent, so build back to front
        for idx in (0..sections.len()).rev() {
            let children: Vec<Section> = child_lists[idx]
                .iter()
                .filter_map(|&c| sections[c].take())
                .collect();
            if let Some(section) = sections[idx].as_mut() {
                section.children = children;
            }
        }

        self.roots
            .iter()
            .filter_map(|&r| sections[r].take())
            .collect()
    }
}

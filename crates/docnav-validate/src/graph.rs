//! Include graph validator
//!
//! Builds a directed graph of `include::` relationships between files and
//! checks it for cycles, chains deeper than the expansion limit, and files
//! that are both included and indexed on their own.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use docnav_core::diagnostics::{Diagnostic, DiagnosticKind};
use docnav_core::include::normalize_path;

use crate::{ValidationContext, Validator};

/// One include directive, as an edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeEdge {
    pub target: PathBuf,
    /// Line of the directive in the including file
    pub line: usize,
}

/// File-level include graph
#[derive(Debug, Clone, Default)]
pub struct IncludeGraph {
    edges: BTreeMap<PathBuf, Vec<IncludeEdge>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

impl IncludeGraph {
    /// Collect every include recorded by the indexed documents
    pub fn from_context(ctx: &ValidationContext<'_>) -> Self {
        let mut graph = Self::default();
        for document in ctx.index.documents() {
            for include in &document.includes {
                graph.add(
                    &include.source_location.file,
                    &include.target_path,
                    include.source_location.line,
                );
            }
        }
        graph
    }

    /// Add an edge; repeated `from -> target` pairs keep the first line
    pub fn add(&mut self, from: &Path, target: &Path, line: usize) {
        let target = normalize_path(target);
        let edges = self.edges.entry(normalize_path(from)).or_default();
        if !edges.iter().any(|e| e.target == target) {
            edges.push(IncludeEdge { target, line });
        }
    }

    pub fn targets(&self, from: &Path) -> &[IncludeEdge] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every included file with the files that include it
    pub fn included_by(&self) -> BTreeMap<&Path, Vec<&Path>> {
        let mut map: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
        for (from, edges) in &self.edges {
            for edge in edges.iter().filter(|e| &e.target != from) {
                map.entry(edge.target.as_path()).or_default().push(from.as_path());
            }
        }
        map
    }

    /// One cycle per back edge found by a depth-first walk. Each cycle
    /// starts and ends with the same file.
    pub fn cycles(&self) -> Vec<(Vec<PathBuf>, usize)> {
        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        let mut cycles = Vec::new();
        for node in self.edges.keys() {
            if !marks.contains_key(node.as_path()) {
                self.visit(node, &mut marks, &mut stack, &mut cycles);
            }
        }
        cycles
    }

    fn visit<'g>(
        &'g self,
        node: &'g Path,
        marks: &mut HashMap<&'g Path, Mark>,
        stack: &mut Vec<&'g Path>,
        cycles: &mut Vec<(Vec<PathBuf>, usize)>,
    ) {
        marks.insert(node, Mark::Active);
        stack.push(node);

        for edge in self.targets(node) {
            let target = edge.target.as_path();
            match marks.get(target) {
                Some(Mark::Active) => {
                    if let Some(pos) = stack.iter().position(|n| *n == target) {
                        let mut cycle: Vec<PathBuf> =
                            stack[pos..].iter().map(|p| p.to_path_buf()).collect();
                        cycle.push(target.to_path_buf());
                        cycles.push((cycle, edge.line));
                    }
                }
                Some(Mark::Done) => {}
                None => self.visit(target, marks, stack, cycles),
            }
        }

        stack.pop();
        marks.insert(node, Mark::Done);
    }

    /// The longest acyclic include chain starting at `start`, `start`
    /// included
    pub fn longest_chain(&self, start: &Path) -> Vec<PathBuf> {
        let mut memo = HashMap::new();
        let mut active = HashSet::new();
        self.depth_from(start, &mut memo, &mut active);

        let mut chain = vec![start.to_path_buf()];
        let mut seen = HashSet::from([start]);
        let mut current = start;
        while let Some(&(_, Some(next))) = memo.get(current) {
            if !seen.insert(next) {
                break;
            }
            chain.push(next.to_path_buf());
            current = next;
        }
        chain
    }

    fn depth_from<'g>(
        &'g self,
        node: &'g Path,
        memo: &mut HashMap<&'g Path, (usize, Option<&'g Path>)>,
        active: &mut HashSet<&'g Path>,
    ) -> usize {
        if let Some(&(depth, _)) = memo.get(node) {
            return depth;
        }
        active.insert(node);

        let mut best: (usize, Option<&'g Path>) = (0, None);
        for edge in self.targets(node) {
            let target = edge.target.as_path();
            if active.contains(target) {
                continue;
            }
            let depth = 1 + self.depth_from(target, memo, active);
            if depth > best.0 {
                best = (depth, Some(target));
            }
        }

        active.remove(node);
        memo.insert(node, best);
        best.0
    }
}

/// Checks the include graph
///
/// # Diagnostic Codes
///
/// - `circular_include` (error): files include each other in a loop
/// - `include_depth_exceeded` (error): a chain of includes starting at an
///   indexed document is longer than `max_include_depth`, so expansion was
///   cut short
/// - `orphaned_include` (warning): an included file is also indexed as a
///   document of its own
pub struct IncludeGraphValidator;

impl Validator for IncludeGraphValidator {
    fn code(&self) -> &'static str {
        "NAV3"
    }

    fn name(&self) -> &'static str {
        "include-graph"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> Vec<Diagnostic> {
        let graph = IncludeGraph::from_context(ctx);
        let mut diagnostics = Vec::new();

        for (cycle, line) in graph.cycles() {
            let chain = join_chain(ctx, &cycle);
            let closing = &cycle[cycle.len().saturating_sub(2)];
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::CircularInclude,
                    format!("Circular include: {}", chain),
                )
                .with_file(ctx.display(closing))
                .with_line(line)
                .with_help("Remove one of the include directives to break the loop"),
            );
        }

        let documents: BTreeSet<PathBuf> = ctx
            .index
            .documents()
            .iter()
            .map(|d| normalize_path(&d.file_path))
            .collect();

        for document in &documents {
            let chain = graph.longest_chain(document);
            let depth = chain.len() - 1;
            if depth <= ctx.max_include_depth {
                continue;
            }
            let line = graph
                .targets(document)
                .iter()
                .find(|e| chain.get(1) == Some(&e.target))
                .map(|e| e.line);
            let mut diagnostic = Diagnostic::error(
                DiagnosticKind::IncludeDepthExceeded,
                format!(
                    "Include chain from '{}' is {} levels deep, more than the limit of {}",
                    ctx.display(document),
                    depth,
                    ctx.max_include_depth
                ),
            )
            .with_file(ctx.display(document))
            .with_note(format!("chain: {}", join_chain(ctx, &chain)))
            .with_help("Content past the limit is not indexed; flatten the include chain");
            if let Some(line) = line {
                diagnostic = diagnostic.with_line(line);
            }
            diagnostics.push(diagnostic);
        }

        for (included, parents) in graph.included_by() {
            if !documents.contains(included) {
                continue;
            }
            let parents: Vec<String> = parents.iter().map(|p| ctx.display(p)).collect();
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::OrphanedInclude,
                    format!(
                        "'{}' is included by {} and is also indexed as a standalone document",
                        ctx.display(included),
                        parents.join(", ")
                    ),
                )
                .with_file(ctx.display(included))
                .with_help(
                    "Index it only through the including document (workspace.skip_included_files)",
                ),
            );
        }

        diagnostics
    }
}

fn join_chain(ctx: &ValidationContext<'_>, chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| ctx.display(p))
        .collect::<Vec<_>>()
        .join(" -> ")
}

//! Parsed source files and small syntax-tree helpers.

use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

use crate::ExtractError;

/// Raw text of one input file plus its syntax tree.
pub struct SourceModule {
    path: Option<PathBuf>,
    text: String,
    tree: Tree,
}

impl SourceModule {
    /// Parse Python source. A tree containing any syntax error is rejected.
    pub fn parse(text: impl Into<String>) -> Result<Self, ExtractError> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ExtractError::ParserInit(e.to_string()))?;

        let tree = parser.parse(&text, None).ok_or(ExtractError::NoTree)?;
        let root = tree.root_node();
        if root.has_error() {
            let bad = first_error(root).unwrap_or(root);
            let pos = bad.start_position();
            return Err(ExtractError::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
            });
        }

        Ok(Self {
            path: None,
            text,
            tree,
        })
    }

    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    /// Top-level statements, comments excluded.
    pub fn statements(&self) -> Vec<Node<'_>> {
        named_children(self.root())
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

/// Named children without comments.
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

/// Every node below `node` (inclusive) of the given kind, in document order.
pub(crate) fn descendants_of_kind<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    collect_kind(node, kind, &mut found);
    found
}

fn collect_kind<'t>(node: Node<'t>, kind: &str, found: &mut Vec<Node<'t>>) {
    if node.kind() == kind {
        found.push(node);
    }
    for child in named_children(node) {
        collect_kind(child, kind, found);
    }
}

/// Last dotted segment of a callee or decorator expression:
/// `tool`, `lc.tools.tool` and `tool(...)` all give `tool`.
pub(crate) fn callee_name<'a>(module: &'a SourceModule, node: Node<'_>) -> Option<&'a str> {
    match node.kind() {
        "identifier" => Some(module.node_text(node)),
        "attribute" => node
            .child_by_field_name("attribute")
            .map(|attr| module.node_text(attr)),
        "call" => node
            .child_by_field_name("function")
            .and_then(|function| callee_name(module, function)),
        _ => None,
    }
}

/// The single statement wrapped by an `expression_statement`.
pub(crate) fn statement_expression(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() != "expression_statement" {
        return None;
    }
    named_children(node).into_iter().next()
}

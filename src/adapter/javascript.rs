//! JavaScript/TypeScript language adapter - the reference implementation
//!
//! Parses with tree-sitter (error tolerant, JSX and TypeScript dialects) and
//! extracts elements with an explicit depth-first walk dispatched on node
//! kind. Matching never suppresses descent, so nested functions and classes
//! are discovered independently.

use crate::element::{CodeElement, ElementKind};
use crate::source::SourceText;
use crate::{Error, Result};
use tree_sitter::{Language, Node, Parser};

use super::framework::{DialectOptions, Extraction, LanguageAdapter};

/// JavaScript/TypeScript language adapter
pub struct JavaScriptAdapter;

impl Default for JavaScriptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaScriptAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Pick the grammar for a file. Extension wins; the dialect's
    /// `type_annotations` flag upgrades plain `.js` to TypeScript parsing.
    fn grammar_for(&self, path: &str, dialect: &DialectOptions) -> Language {
        let ext = path.rsplit('.').next().unwrap_or_default().to_lowercase();
        match ext.as_str() {
            "ts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            _ if dialect.type_annotations => {
                if dialect.jsx {
                    tree_sitter_typescript::LANGUAGE_TSX.into()
                } else {
                    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
                }
            }
            // The JS grammar already accepts JSX and module syntax
            _ => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

impl LanguageAdapter for JavaScriptAdapter {
    fn language_name(&self) -> &str {
        "JavaScript"
    }

    fn file_extensions(&self) -> &[&str] {
        &["js", "jsx", "mjs", "cjs", "ts", "tsx"]
    }

    fn extract(
        &self,
        path: &str,
        source: &SourceText,
        dialect: &DialectOptions,
    ) -> Result<Extraction> {
        let language = self.grammar_for(path, dialect);
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| Error::AdapterUnavailable(format!("failed to load grammar: {}", e)))?;

        let tree = parser
            .parse(source.text(), None)
            .ok_or_else(|| Error::ParseFatal(format!("parser returned no tree for {}", path)))?;

        let root = tree.root_node();
        let mut elements = Vec::new();
        visit(root, source, &mut elements);

        if root.has_error() {
            Ok(Extraction::degraded(elements, "syntax errors, partial extraction"))
        } else {
            Ok(Extraction::ok(elements))
        }
    }
}

/// Depth-first, document-order walk. A node matches at most one rule; every
/// named child is visited regardless of a match.
fn visit(node: Node, source: &SourceText, elements: &mut Vec<CodeElement>) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            let name = field_text(node, "name", source);
            push_element(elements, ElementKind::Function, name, node, source);
        }
        "class_declaration" => {
            let name = field_text(node, "name", source);
            push_element(elements, ElementKind::Class, name, node, source);
        }
        "variable_declarator" => {
            // One element per function-valued binding, named after the
            // binding but spanning the initializer. A declaration statement
            // with several declarators yields one independently-spanned
            // element per function-valued one.
            if let Some(value) = node.child_by_field_name("value") {
                if is_function_valued(&value) {
                    let name = field_text(node, "name", source);
                    push_element(elements, ElementKind::Function, name, value, source);
                }
            }
        }
        "export_statement" => {
            // Anonymous default exports surface as bare expressions here
            // and would otherwise never match a declaration rule.
            if let Some(value) = node.child_by_field_name("value") {
                if is_function_valued(&value) {
                    push_element(elements, ElementKind::Function, String::new(), value, source);
                } else if value.kind() == "class" {
                    push_element(elements, ElementKind::Class, String::new(), value, source);
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit(child, source, elements);
    }
}

fn is_function_valued(node: &Node) -> bool {
    matches!(node.kind(), "arrow_function" | "function_expression" | "function")
}

fn field_text(node: Node, field: &str, source: &SourceText) -> String {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source.text().as_bytes()).ok())
        .unwrap_or_default()
        .to_string()
}

/// Emit an element spanning `span_node`'s lines, with the snippet re-sliced
/// verbatim from the original text at those line bounds.
fn push_element(
    elements: &mut Vec<CodeElement>,
    kind: ElementKind,
    name: String,
    span_node: Node,
    source: &SourceText,
) {
    let start_line = source.clamp_line(span_node.start_position().row as u32 + 1);
    let end_line = source.clamp_line(span_node.end_position().row as u32 + 1);
    if let Some(snippet) = source.slice_lines(start_line, end_line) {
        elements.push(CodeElement::new(kind, name, start_line, end_line, snippet));
    }
}

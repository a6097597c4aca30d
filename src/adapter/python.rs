//! Python language adapter
//!
//! Same walk contract as the JavaScript reference adapter, over the
//! tree-sitter Python grammar. Elements from this family are stored with
//! the `_py` kind suffix.

use crate::element::{CodeElement, ElementKind};
use crate::source::SourceText;
use crate::{Error, Result};
use tree_sitter::{Node, Parser};

use super::framework::{DialectOptions, Extraction, LanguageAdapter};

/// Python language adapter
pub struct PythonAdapter;

impl Default for PythonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageAdapter for PythonAdapter {
    fn language_name(&self) -> &str {
        "Python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn extract(
        &self,
        path: &str,
        source: &SourceText,
        _dialect: &DialectOptions,
    ) -> Result<Extraction> {
        let language = tree_sitter_python::LANGUAGE.into();
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

fn visit(node: Node, source: &SourceText, elements: &mut Vec<CodeElement>) {
    match node.kind() {
        "function_definition" => {
            push_element(elements, ElementKind::Function, node, source);
        }
        "class_definition" => {
            push_element(elements, ElementKind::Class, node, source);
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        visit(child, source, elements);
    }
}

fn push_element(
    elements: &mut Vec<CodeElement>,
    kind: ElementKind,
    node: Node,
    source: &SourceText,
) {
    let name = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source.text().as_bytes()).ok())
        .unwrap_or_default()
        .to_string();

    let start_line = source.clamp_line(node.start_position().row as u32 + 1);
    let end_line = source.clamp_line(node.end_position().row as u32 + 1);
    if let Some(snippet) = source.slice_lines(start_line, end_line) {
        elements.push(CodeElement::new(kind, name, start_line, end_line, snippet));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Extraction {
        let adapter = PythonAdapter::new();
        adapter
            .extract("mod.py", &SourceText::new(source), &DialectOptions::default())
            .expect("extraction failed")
    }

    #[test]
    fn test_functions_and_classes() {
        let source = "def top():\n    pass\n\nclass Widget:\n    def method(self):\n        pass\n";
        let extraction = extract(source);

        let names: Vec<(&str, ElementKind)> = extraction
            .elements
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("top", ElementKind::Function),
                ("Widget", ElementKind::Class),
                ("method", ElementKind::Function),
            ]
        );
    }

    #[test]
    fn test_indentation_preserved() {
        let source = "class A:\n    def m(self):\n        return 1\n";
        let extraction = extract(source);

        let m = extraction.elements.iter().find(|e| e.name == "m").unwrap();
        assert_eq!(m.snippet, "    def m(self):\n        return 1");
    }

    #[test]
    fn test_shadowed_names_kept_separately() {
        let source = "def run():\n    pass\n\ndef run():\n    return 2\n";
        let extraction = extract(source);

        let runs: Vec<_> = extraction.elements.iter().filter(|e| e.name == "run").collect();
        assert_eq!(runs.len(), 2);
        assert_ne!(runs[0].start_line, runs[1].start_line);
    }

    #[test]
    fn test_syntax_error_degrades() {
        let source = "def ok():\n    pass\n\ndef broken(:\n";
        let extraction = extract(source);

        assert_eq!(extraction.status, crate::adapter::ParseStatus::Degraded);
        assert!(extraction.elements.iter().any(|e| e.name == "ok"));
    }
}

//! Heuristic fallback scanner - best-effort coverage for grammarless files
//!
//! For files no language adapter claims, scan line-by-line for common
//! definition keywords and emit single-line elements. This keeps such files
//! recorded and findable while the tree-sitter adapters provide precise
//! spans for supported languages.

use crate::element::{CodeElement, ElementKind};
use crate::source::SourceText;
use regex::Regex;

use super::framework::Extraction;

/// Keyword-scanning fallback for files without a grammar
pub struct HeuristicScanner {
    function_re: Regex,
    class_re: Regex,
}

impl Default for HeuristicScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicScanner {
    pub fn new() -> Self {
        // Definition keywords across the common grammarless suspects
        // (Ruby, Go, shell functions, ...). Names follow the usual
        // identifier shape: no leading digit.
        let function_re =
            Regex::new(r"^\s*(?:def|function|func|fn|sub)\s+([A-Za-z_][A-Za-z0-9_]*)")
                .expect("static regex");
        let class_re = Regex::new(r"^\s*(?:class|struct|module)\s+([A-Za-z_][A-Za-z0-9_]*)")
            .expect("static regex");
        Self {
            function_re,
            class_re,
        }
    }

    /// Scan a file for definition-shaped lines.
    ///
    /// Hits yield single-line elements and a degraded status; a file with
    /// no hits is recorded as unsupported.
    pub fn scan(&self, path: &str, source: &SourceText) -> Extraction {
        let mut elements = Vec::new();

        for (idx, line) in source.text().split('\n').enumerate() {
            let line_no = idx as u32 + 1;
            if line_no > source.line_count() {
                break;
            }

            let (kind, name) = if let Some(caps) = self.function_re.captures(line) {
                (ElementKind::Function, caps[1].to_string())
            } else if let Some(caps) = self.class_re.captures(line) {
                (ElementKind::Class, caps[1].to_string())
            } else {
                continue;
            };

            if let Some(snippet) = source.slice_lines(line_no, line_no) {
                elements.push(CodeElement::new(kind, name, line_no, line_no, snippet));
            }
        }

        if elements.is_empty() {
            tracing::debug!("no adapter and no heuristic signal for {}", path);
            Extraction::unsupported(format!("no adapter for {}", path))
        } else {
            Extraction::degraded(elements, "no grammar available, keyword scan only")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ParseStatus;

    #[test]
    fn test_ruby_definitions() {
        let scanner = HeuristicScanner::new();
        let source = SourceText::new("class Invoice\n  def total\n    0\n  end\nend\n");
        let extraction = scanner.scan("invoice.rb", &source);

        assert_eq!(extraction.status, ParseStatus::Degraded);
        assert_eq!(extraction.elements.len(), 2);
        assert_eq!(extraction.elements[0].kind, ElementKind::Class);
        assert_eq!(extraction.elements[0].name, "Invoice");
        assert_eq!(extraction.elements[1].kind, ElementKind::Function);
        assert_eq!(extraction.elements[1].name, "total");
        assert_eq!(extraction.elements[1].snippet, "  def total");
    }

    #[test]
    fn test_go_definitions() {
        let scanner = HeuristicScanner::new();
        let source = SourceText::new("func Sum(a, b int) int {\n\treturn a + b\n}\n");
        let extraction = scanner.scan("sum.go", &source);

        assert_eq!(extraction.elements.len(), 1);
        assert_eq!(extraction.elements[0].name, "Sum");
        assert_eq!(extraction.elements[0].start_line, 1);
        assert_eq!(extraction.elements[0].end_line, 1);
    }

    #[test]
    fn test_prose_is_unsupported() {
        let scanner = HeuristicScanner::new();
        let source = SourceText::new("# Release notes\n\nNothing to see.\n");
        let extraction = scanner.scan("NOTES.md", &source);

        assert_eq!(extraction.status, ParseStatus::Unsupported);
        assert!(extraction.elements.is_empty());
    }
}

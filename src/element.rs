//! Code element types - the central unit of the catalog
//!
//! Every supported language is mapped into two element kinds:
//! - `Function`: named function definitions and function-valued bindings
//! - `Class`: class-like container definitions
//!
//! Elements are file-scoped and lexical: a flat catalog with line spans and
//! literal snippets, not a compiled symbol table.

use serde::{Deserialize, Serialize};

/// Kind of an extracted code element.
///
/// On the wire and in the store the kind is a tag string (`function`,
/// `class`), suffixed with `_<family>` when a non-default language family
/// shares the store (e.g. `function_py`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Function, method, or function-valued binding
    Function,
    /// Class, or class-valued binding
    Class,
}

impl ElementKind {
    /// Get the base string representation of the element kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Function => "function",
            ElementKind::Class => "class",
        }
    }

    /// Get all element kinds
    pub fn all() -> &'static [ElementKind] {
        &[ElementKind::Function, ElementKind::Class]
    }

    /// Build the stored/transport tag for this kind in the given language
    /// family. `None` is the default family and carries no suffix.
    pub fn wire_tag(&self, family: Option<&str>) -> String {
        match family {
            Some(suffix) => format!("{}_{}", self.as_str(), suffix),
            None => self.as_str().to_string(),
        }
    }

    /// Parse a stored/transport tag back into a kind, tolerating any
    /// `_<family>` suffix.
    pub fn from_wire_tag(tag: &str) -> Option<ElementKind> {
        let base = tag.split('_').next().unwrap_or(tag);
        match base {
            "function" => Some(ElementKind::Function),
            "class" => Some(ElementKind::Class),
            _ => None,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One catalogued function- or class-like construct extracted from a file.
///
/// Created only by the element extractor during indexing; immutable once
/// created; deleted en masse when the owning file is re-indexed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeElement {
    /// The kind of element
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Identifier text; empty when the construct is anonymous
    pub name: String,
    /// Starting line number (1-indexed, inclusive)
    pub start_line: u32,
    /// Ending line number (1-indexed, inclusive)
    pub end_line: u32,
    /// Exact source substring spanning `start_line..=end_line`,
    /// newline-joined, whitespace preserved verbatim
    pub snippet: String,
}

impl CodeElement {
    /// Create a new element with an explicit snippet
    pub fn new(
        kind: ElementKind,
        name: impl Into<String>,
        start_line: u32,
        end_line: u32,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            start_line,
            end_line,
            snippet: snippet.into(),
        }
    }

    /// True when the source construct had no usable identifier
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

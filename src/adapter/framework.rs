//! Core adapter framework
//!
//! Defines the traits and types that all language adapters must implement,
//! and the registry that routes files to them with soft-failure semantics:
//! a broken adapter degrades one file, it never aborts the indexing run.

use crate::element::CodeElement;
use crate::source::SourceText;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dialect options passed to adapters.
///
/// Unknown flags in serialized form are ignored rather than rejected, so
/// configs stay forward compatible as grammars evolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialectOptions {
    /// Enable module (import/export) syntax
    #[serde(default = "default_true")]
    pub module_syntax: bool,
    /// Enable JSX constructs
    #[serde(default = "default_true")]
    pub jsx: bool,
    /// Enable type annotations (TypeScript extensions)
    #[serde(default)]
    pub type_annotations: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DialectOptions {
    fn default() -> Self {
        Self {
            module_syntax: true,
            jsx: true,
            type_annotations: false,
        }
    }
}

/// Status of a single file's extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    /// Full parse, all elements extracted
    Ok,
    /// Partial or zero elements: malformed source, missing toolchain,
    /// or heuristic-only extraction
    Degraded,
    /// No adapter and no heuristic signal; file recorded without elements
    Unsupported,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStatus::Ok => "ok",
            ParseStatus::Degraded => "degraded",
            ParseStatus::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of extracting one file with a language adapter
#[derive(Debug)]
pub struct Extraction {
    /// Extracted elements, in document order
    pub elements: Vec<CodeElement>,
    /// Extraction status
    pub status: ParseStatus,
    /// Specific reason when status is not `Ok`, for run summaries
    pub reason: Option<String>,
}

impl Extraction {
    /// A complete extraction
    pub fn ok(elements: Vec<CodeElement>) -> Self {
        Self {
            elements,
            status: ParseStatus::Ok,
            reason: None,
        }
    }

    /// A degraded extraction carrying whatever parsed plus the reason
    pub fn degraded(elements: Vec<CodeElement>, reason: impl Into<String>) -> Self {
        Self {
            elements,
            status: ParseStatus::Degraded,
            reason: Some(reason.into()),
        }
    }

    /// An unsupported file; still recorded, zero elements
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            elements: Vec::new(),
            status: ParseStatus::Unsupported,
            reason: Some(reason.into()),
        }
    }
}

/// Trait for language adapters
///
/// Each adapter is responsible for:
/// 1. Identifying files it can parse
/// 2. Turning source text into a language-neutral element list
/// 3. Recovering as much structure as possible from malformed input -
///    a single bad construct must not suppress well-formed siblings
pub trait LanguageAdapter: Send + Sync {
    /// Get the language name (for display and diagnostics)
    fn language_name(&self) -> &str;

    /// Get file extensions this adapter handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this adapter can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            self.file_extensions().contains(&ext.as_str())
        } else {
            false
        }
    }

    /// Extract elements from a file's text
    fn extract(
        &self,
        path: &str,
        source: &SourceText,
        dialect: &DialectOptions,
    ) -> Result<Extraction>;
}

/// Registry of language adapters with a heuristic fallback
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn LanguageAdapter>>,
    fallback: super::heuristic::HeuristicScanner,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            fallback: super::heuristic::HeuristicScanner::new(),
        }
    }

    /// Register an adapter
    pub fn register(&mut self, adapter: impl LanguageAdapter + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Find an adapter for a file
    pub fn find_adapter(&self, path: &Path) -> Option<&dyn LanguageAdapter> {
        self.adapters
            .iter()
            .find(|a| a.can_handle(path))
            .map(|a| a.as_ref())
    }

    /// Get all registered adapters
    pub fn adapters(&self) -> &[Box<dyn LanguageAdapter>] {
        &self.adapters
    }

    /// Extract elements from a file, never failing the run.
    ///
    /// Adapter errors (missing grammar, fatal parse) become degraded
    /// extractions with the reason preserved for the run summary. Files no
    /// adapter claims go through the keyword-scanning fallback.
    pub fn extract_file(
        &self,
        path: &Path,
        source: &SourceText,
        dialect: &DialectOptions,
    ) -> Extraction {
        let rel_path = path.to_string_lossy();
        if let Some(adapter) = self.find_adapter(path) {
            match adapter.extract(&rel_path, source, dialect) {
                Ok(extraction) => extraction,
                Err(e) => {
                    tracing::warn!(
                        "adapter {} failed on {}: {}",
                        adapter.language_name(),
                        rel_path,
                        e
                    );
                    Extraction::degraded(Vec::new(), e.to_string())
                }
            }
        } else {
            self.fallback.scan(&rel_path, source)
        }
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(super::javascript::JavaScriptAdapter::new());
    registry.register(super::python::PythonAdapter::new());
    registry
}

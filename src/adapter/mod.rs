//! Language adapters
//!
//! An adapter turns source text into a language-neutral element list. The
//! JavaScript/TypeScript adapter is the reference implementation; the
//! heuristic scanner covers files without a grammar.

pub mod framework;
pub mod heuristic;
pub mod javascript;
pub mod python;

pub use framework::{
    default_registry, AdapterRegistry, DialectOptions, Extraction, LanguageAdapter, ParseStatus,
};
pub use heuristic::HeuristicScanner;
pub use javascript::JavaScriptAdapter;
pub use python::PythonAdapter;

//! # Codebridge - Cross-Project Code Knowledge Core
//!
//! Turns heterogeneous source files from independently-versioned repositories
//! into a normalized catalog of addressable code elements, and makes that
//! catalog searchable for downstream tooling (transfer, documentation,
//! analysis).
//!
//! Codebridge provides:
//! - Line-addressable source handling with verbatim snippet slicing
//! - Tree-sitter based parsing with pluggable language adapters
//! - A language-neutral element extractor (functions, classes, bindings)
//! - SQLite-backed normalized storage with cascade semantics
//! - A filtered, deterministically-ordered search engine

pub mod adapter;
pub mod config;
pub mod element;
pub mod indexer;
pub mod query;
pub mod source;
pub mod store;

// Re-exports for convenient access
pub use adapter::{AdapterRegistry, DialectOptions, Extraction, ParseStatus};
pub use element::{CodeElement, ElementKind};
pub use indexer::{FileInput, IndexOptions, IndexOutcome, IndexSummary, Indexer};
pub use query::{SearchEngine, SearchFilters, SearchHit, TextMatch};
pub use source::SourceText;
pub use store::KnowledgeStore;

/// Result type alias for Codebridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Codebridge operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required parsing toolchain is missing or failed to load.
    /// Callers degrade the file rather than aborting the run.
    #[error("Adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// The adapter crashed or produced no tree at all.
    /// Callers record the file with zero elements and a degraded status.
    #[error("Parse failed: {0}")]
    ParseFatal(String),

    /// A write referenced a non-existent parent or carried an element whose
    /// span/snippet does not match the file content. Never silently dropped.
    #[error("Store integrity violation: {0}")]
    StoreIntegrity(String),

    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    #[error("Unknown path: {path} in repository {repository}")]
    UnknownPath { repository: String, path: String },

    #[error("Invalid path glob: {0}")]
    InvalidGlob(String),
}

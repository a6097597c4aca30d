//! Query/search engine over the knowledge store

pub mod engine;

pub use engine::{SearchEngine, SearchFilters, SearchHit, TextMatch};

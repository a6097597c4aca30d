//! Knowledge store - normalized persistence for the element catalog

pub mod schema;
pub mod sqlite;

pub use sqlite::{KnowledgeStore, StoreStats};

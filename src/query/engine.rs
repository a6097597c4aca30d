//! Search engine implementation
//!
//! Content-aware search over stored elements and raw file text. Results are
//! ordered by repository name, then relative path, then start line, so
//! identical inputs always produce identical output.

use rusqlite::{OptionalExtension, ToSql};
use serde::{Deserialize, Serialize};

use crate::element::ElementKind;
use crate::store::KnowledgeStore;
use crate::{Error, Result};

/// Optional filters composed conjunctively: every supplied filter must hold
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict to one repository by exact name
    pub repository: Option<String>,
    /// Restrict to a base element kind (family suffixes match implicitly)
    pub kind: Option<ElementKind>,
    /// Restrict to a detected language tag
    pub language: Option<String>,
    /// Restrict to paths matching a glob (e.g. `src/**/*.ts`)
    pub path_glob: Option<String>,
}

/// One element match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub repository: String,
    pub path: String,
    pub language: String,
    /// Stored kind tag, family suffix included (e.g. `function_py`)
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub snippet: String,
}

/// One raw-text line occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextMatch {
    pub repository: String,
    pub path: String,
    pub language: String,
    pub line: u32,
    pub text: String,
}

/// Search engine over a knowledge store
pub struct SearchEngine<'a> {
    store: &'a KnowledgeStore,
}

impl<'a> SearchEngine<'a> {
    /// Create a new search engine
    pub fn new(store: &'a KnowledgeStore) -> Self {
        Self { store }
    }

    /// Search stored elements by substring against name and snippet.
    ///
    /// An empty query matches every element within the filter scope. A
    /// repository filter naming a repository that does not exist is an
    /// explicit `UnknownRepository` error, never an empty result.
    pub fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        self.check_repository_scope(filters)?;

        let mut sql = String::from(
            r#"
            SELECT r.name, f.relative_path, f.language, e.kind, e.name,
                   e.start_line, e.end_line, e.snippet
            FROM elements e
            JOIN files f ON e.file_id = f.id
            JOIN repositories r ON f.repository_id = r.id
            "#,
        );

        let mut conditions: Vec<String> = Vec::new();
        let mut owned: Vec<String> = Vec::new();

        if !query.is_empty() {
            owned.push(format!("%{}%", query));
            let n = owned.len();
            conditions.push(format!("(e.name LIKE ?{n} OR e.snippet LIKE ?{n})"));
        }
        if let Some(repo) = &filters.repository {
            owned.push(repo.clone());
            conditions.push(format!("r.name = ?{}", owned.len()));
        }
        if let Some(kind) = filters.kind {
            owned.push(kind.as_str().to_string());
            let n = owned.len();
            conditions.push(format!("(e.kind = ?{n} OR e.kind LIKE ?{n} || '_%')"));
        }
        if let Some(language) = &filters.language {
            owned.push(language.to_lowercase());
            conditions.push(format!("f.language = ?{}", owned.len()));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY r.name, f.relative_path, e.start_line, e.id");

        let params: Vec<&dyn ToSql> = owned.iter().map(|s| s as &dyn ToSql).collect();
        let mut stmt = self.store.connection().prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok(SearchHit {
                repository: row.get(0)?,
                path: row.get(1)?,
                language: row.get(2)?,
                kind: row.get(3)?,
                name: row.get(4)?,
                start_line: row.get(5)?,
                end_line: row.get(6)?,
                snippet: row.get(7)?,
            })
        })?;

        let glob = compile_glob(filters)?;
        let mut hits = Vec::new();
        for row in rows {
            let hit = row?;
            if let Some(pattern) = &glob {
                if !pattern.matches(&hit.path) {
                    continue;
                }
            }
            hits.push(hit);
            if hits.len() >= limit {
                break;
            }
        }
        Ok(hits)
    }

    /// Search raw stored file text for a substring, line by line.
    ///
    /// Catches occurrences outside any extracted element (free-text
    /// queries over config, comments, prose).
    pub fn search_text(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<TextMatch>> {
        self.check_repository_scope(filters)?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = String::from(
            r#"
            SELECT r.name, f.relative_path, f.language, f.content
            FROM files f
            JOIN repositories r ON f.repository_id = r.id
            "#,
        );

        let mut conditions: Vec<String> = Vec::new();
        let mut owned: Vec<String> = Vec::new();

        owned.push(format!("%{}%", query));
        conditions.push(format!("f.content LIKE ?{}", owned.len()));

        if let Some(repo) = &filters.repository {
            owned.push(repo.clone());
            conditions.push(format!("r.name = ?{}", owned.len()));
        }
        if let Some(language) = &filters.language {
            owned.push(language.to_lowercase());
            conditions.push(format!("f.language = ?{}", owned.len()));
        }

        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
        sql.push_str(" ORDER BY r.name, f.relative_path");

        let params: Vec<&dyn ToSql> = owned.iter().map(|s| s as &dyn ToSql).collect();
        let mut stmt = self.store.connection().prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let glob = compile_glob(filters)?;
        let mut matches = Vec::new();
        'files: for row in rows {
            let (repository, path, language, content) = row?;
            if let Some(pattern) = &glob {
                if !pattern.matches(&path) {
                    continue;
                }
            }
            for (idx, line) in content.split('\n').enumerate() {
                if line.contains(query) {
                    matches.push(TextMatch {
                        repository: repository.clone(),
                        path: path.clone(),
                        language: language.clone(),
                        line: idx as u32 + 1,
                        text: line.to_string(),
                    });
                    if matches.len() >= limit {
                        break 'files;
                    }
                }
            }
        }
        Ok(matches)
    }

    /// Get the snippet of the element starting at a given line, if any
    pub fn get_element_by_location(
        &self,
        repository: &str,
        path: &str,
        start_line: u32,
    ) -> Result<Option<String>> {
        let repo_id = self
            .store
            .repository_id(repository)?
            .ok_or_else(|| Error::UnknownRepository(repository.to_string()))?;

        // Distinguish a missing file from a line with no element
        self.store.get_file_content(repository, path)?;

        let snippet = self
            .store
            .connection()
            .query_row(
                r#"
                SELECT e.snippet
                FROM elements e
                JOIN files f ON e.file_id = f.id
                WHERE f.repository_id = ?1 AND f.relative_path = ?2 AND e.start_line = ?3
                ORDER BY e.id
                LIMIT 1
                "#,
                rusqlite::params![repo_id, path, start_line],
                |row| row.get(0),
            )
            .optional()
            .map_err(crate::Error::from)?;
        Ok(snippet)
    }

    fn check_repository_scope(&self, filters: &SearchFilters) -> Result<()> {
        if let Some(repo) = &filters.repository {
            if self.store.repository_id(repo)?.is_none() {
                return Err(Error::UnknownRepository(repo.clone()));
            }
        }
        Ok(())
    }
}

fn compile_glob(filters: &SearchFilters) -> Result<Option<glob::Pattern>> {
    match &filters.path_glob {
        Some(raw) => {
            let pattern = glob::Pattern::new(raw)
                .map_err(|e| Error::InvalidGlob(format!("{}: {}", raw, e)))?;
            Ok(Some(pattern))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ParseStatus;
    use crate::element::CodeElement;

    fn seeded_store() -> KnowledgeStore {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo_a = store.upsert_repository("A", "/src/a").unwrap();
        let repo_b = store.upsert_repository("B", "/src/b").unwrap();

        // util.ext: computeTotal on lines 10..14
        let mut content = String::new();
        for i in 1..=9 {
            content.push_str(&format!("// filler {}\n", i));
        }
        content.push_str(
            "function computeTotal(items) {\n  return items\n    .map(i => i.price)\n    .reduce((a, b) => a + b, 0);\n}\n",
        );
        let snippet = crate::source::SourceText::new(content.as_str())
            .slice_lines(10, 14)
            .unwrap();
        let elements = vec![CodeElement::new(
            ElementKind::Function,
            "computeTotal",
            10,
            14,
            snippet,
        )];
        store
            .replace_file_elements(repo_a, "util.ext", &content, "javascript", "ha", ParseStatus::Ok, &elements)
            .unwrap();

        let b_content = "def compute_total():\n    pass\n";
        let b_elements = vec![CodeElement::new(
            ElementKind::Function,
            "compute_total",
            1,
            2,
            "def compute_total():\n    pass",
        )];
        store
            .replace_file_elements(repo_b, "calc.py", b_content, "python", "hb", ParseStatus::Ok, &b_elements)
            .unwrap();

        store
    }

    #[test]
    fn test_search_scenario_compute_total() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let filters = SearchFilters {
            repository: Some("A".to_string()),
            ..Default::default()
        };
        let hits = engine.search("computeTotal", &filters, 10).unwrap();

        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.repository, "A");
        assert_eq!(hit.path, "util.ext");
        assert_eq!((hit.start_line, hit.end_line), (10, 14));
        assert_eq!(hit.snippet.split('\n').count(), 5);
        assert!(hit.snippet.starts_with("function computeTotal"));
    }

    #[test]
    fn test_unknown_repository_is_explicit() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let filters = SearchFilters {
            repository: Some("ghost".to_string()),
            ..Default::default()
        };
        let err = engine.search("anything", &filters, 10).unwrap_err();
        assert!(matches!(err, Error::UnknownRepository(_)));
    }

    #[test]
    fn test_filters_compose_conjunctively() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        // Substring hits both repositories without filters
        let all = engine.search("compute", &SearchFilters::default(), 10).unwrap();
        assert_eq!(all.len(), 2);

        // Language narrows to one
        let filters = SearchFilters {
            language: Some("python".to_string()),
            ..Default::default()
        };
        let py = engine.search("compute", &filters, 10).unwrap();
        assert_eq!(py.len(), 1);
        assert_eq!(py[0].kind, "function_py");

        // Adding a non-matching repository scope empties it
        let filters = SearchFilters {
            language: Some("python".to_string()),
            repository: Some("A".to_string()),
            ..Default::default()
        };
        assert!(engine.search("compute", &filters, 10).unwrap().is_empty());
    }

    #[test]
    fn test_kind_filter_spans_families() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let filters = SearchFilters {
            kind: Some(ElementKind::Function),
            ..Default::default()
        };
        // Matches both `function` and `function_py`
        let hits = engine.search("", &filters, 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_path_glob_filter() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let filters = SearchFilters {
            path_glob: Some("*.py".to_string()),
            ..Default::default()
        };
        let hits = engine.search("compute", &filters, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "calc.py");
    }

    #[test]
    fn test_ordering_is_stable() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let first = engine.search("compute", &SearchFilters::default(), 10).unwrap();
        let second = engine.search("compute", &SearchFilters::default(), 10).unwrap();
        let order: Vec<(String, String, u32)> = first
            .iter()
            .map(|h| (h.repository.clone(), h.path.clone(), h.start_line))
            .collect();
        let order2: Vec<(String, String, u32)> = second
            .iter()
            .map(|h| (h.repository.clone(), h.path.clone(), h.start_line))
            .collect();
        assert_eq!(order, order2);
        // Repository A sorts before B
        assert_eq!(first[0].repository, "A");
    }

    #[test]
    fn test_search_text_raw_occurrences() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let matches = engine.search_text("filler 3", &SearchFilters::default(), 10).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path, "util.ext");
        assert_eq!(matches[0].line, 3);
    }

    #[test]
    fn test_get_element_by_location() {
        let store = seeded_store();
        let engine = SearchEngine::new(&store);

        let snippet = engine
            .get_element_by_location("A", "util.ext", 10)
            .unwrap()
            .unwrap();
        assert!(snippet.starts_with("function computeTotal"));

        // Line without an element
        assert!(engine.get_element_by_location("A", "util.ext", 2).unwrap().is_none());

        // Unknown scopes are explicit errors
        assert!(matches!(
            engine.get_element_by_location("ghost", "util.ext", 10).unwrap_err(),
            Error::UnknownRepository(_)
        ));
        assert!(matches!(
            engine.get_element_by_location("A", "missing.js", 10).unwrap_err(),
            Error::UnknownPath { .. }
        ));
    }
}

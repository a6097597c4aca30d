//! SQLite-backed knowledge store
//!
//! Durable persistence for repositories, files, and elements with
//! referential integrity. Element replacement is one transaction per file:
//! a reader sees either the pre- or post-replace element set, never a mix.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::adapter::ParseStatus;
use crate::element::{CodeElement, ElementKind};
use crate::source::{language_family_suffix, SourceText};
use crate::{Error, Result};

use super::schema;

/// The normalized persistent catalog of repositories, files, and elements
pub struct KnowledgeStore {
    conn: Connection,
}

impl KnowledgeStore {
    /// Open a database file (creates if it doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        // Cascade deletes depend on this pragma
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Repository Operations ==========

    /// Insert or refresh a repository; idempotent by name
    pub fn upsert_repository(&self, name: &str, origin: &str) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO repositories (name, origin)
            VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET
                origin = excluded.origin,
                last_indexed_at = datetime('now')
            "#,
            params![name, origin],
        )?;

        let id: i64 = self.conn.query_row(
            "SELECT id FROM repositories WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Look up a repository id by name
    pub fn repository_id(&self, name: &str) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT id FROM repositories WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()
            .map_err(Into::into)
    }

    /// Remove a repository, cascading to its files and elements.
    ///
    /// Returns false (not an error) when no such repository exists.
    pub fn remove_repository(&self, name: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM repositories WHERE name = ?1", [name])?;
        if removed == 0 {
            tracing::debug!("remove_repository: no repository named {}", name);
        }
        Ok(removed > 0)
    }

    // ========== File Operations ==========

    /// Atomically replace a file's record and all of its elements.
    ///
    /// Either all new elements become visible and all previous ones are
    /// gone, or (on any failure) the prior state is left untouched. Every
    /// element is validated against the content before the write begins:
    /// spans must lie inside the file and snippets must re-derive exactly.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_file_elements(
        &mut self,
        repository_id: i64,
        relative_path: &str,
        content: &str,
        language: &str,
        content_hash: &str,
        status: ParseStatus,
        elements: &[CodeElement],
    ) -> Result<()> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM repositories WHERE id = ?1",
                [repository_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(Error::StoreIntegrity(format!(
                "file {} references non-existent repository id {}",
                relative_path, repository_id
            )));
        }

        validate_elements(relative_path, content, elements)?;

        let family = language_family_suffix(language);
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO files (repository_id, relative_path, language, content, content_hash, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(repository_id, relative_path) DO UPDATE SET
                language = excluded.language,
                content = excluded.content,
                content_hash = excluded.content_hash,
                status = excluded.status,
                last_scanned_at = datetime('now')
            "#,
            params![
                repository_id,
                relative_path,
                language,
                content,
                content_hash,
                status.as_str()
            ],
        )?;

        let file_id: i64 = tx.query_row(
            "SELECT id FROM files WHERE repository_id = ?1 AND relative_path = ?2",
            params![repository_id, relative_path],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM elements WHERE file_id = ?1", [file_id])?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO elements (file_id, kind, name, start_line, end_line, snippet)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for element in elements {
                stmt.execute(params![
                    file_id,
                    element.kind.wire_tag(family),
                    element.name,
                    element.start_line,
                    element.end_line,
                    element.snippet,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get the literal stored text of a file
    pub fn get_file_content(&self, repository: &str, path: &str) -> Result<String> {
        let repo_id = self
            .repository_id(repository)?
            .ok_or_else(|| Error::UnknownRepository(repository.to_string()))?;

        self.conn
            .query_row(
                "SELECT content FROM files WHERE repository_id = ?1 AND relative_path = ?2",
                params![repo_id, path],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::UnknownPath {
                repository: repository.to_string(),
                path: path.to_string(),
            })
    }

    /// Content hashes of every file in a repository, for unchanged-skip
    pub fn file_hashes(&self, repository_id: i64) -> Result<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT relative_path, content_hash FROM files WHERE repository_id = ?1")?;
        let rows = stmt.query_map([repository_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut hashes = HashMap::new();
        for row in rows {
            let (path, hash) = row?;
            hashes.insert(path, hash);
        }
        Ok(hashes)
    }

    /// Stored status of a file, if present
    pub fn file_status(&self, repository_id: i64, path: &str) -> Result<Option<ParseStatus>> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM files WHERE repository_id = ?1 AND relative_path = ?2",
                params![repository_id, path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(status.as_deref().and_then(parse_status_tag))
    }

    // ========== Element Operations ==========

    /// All elements of a file in document order
    pub fn elements_in_file(&self, repository_id: i64, path: &str) -> Result<Vec<CodeElement>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.kind, e.name, e.start_line, e.end_line, e.snippet
            FROM elements e
            JOIN files f ON e.file_id = f.id
            WHERE f.repository_id = ?1 AND f.relative_path = ?2
            ORDER BY e.id
            "#,
        )?;

        let rows = stmt.query_map(params![repository_id, path], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut elements = Vec::new();
        for row in rows {
            let (tag, name, start_line, end_line, snippet) = row?;
            match ElementKind::from_wire_tag(&tag) {
                Some(kind) => {
                    elements.push(CodeElement::new(kind, name, start_line, end_line, snippet))
                }
                None => tracing::warn!("skipping element with unknown kind tag {}", tag),
            }
        }
        Ok(elements)
    }

    // ========== Counts & Stats ==========

    pub fn count_repositories(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM repositories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_files(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_elements(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM elements", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            repositories: self.count_repositories()?,
            files: self.count_files()?,
            elements: self.count_elements()?,
        })
    }
}

fn parse_status_tag(tag: &str) -> Option<ParseStatus> {
    match tag {
        "ok" => Some(ParseStatus::Ok),
        "degraded" => Some(ParseStatus::Degraded),
        "unsupported" => Some(ParseStatus::Unsupported),
        _ => None,
    }
}

/// Check the element invariants before anything is written
fn validate_elements(path: &str, content: &str, elements: &[CodeElement]) -> Result<()> {
    let source = SourceText::new(content);
    for element in elements {
        if element.start_line < 1
            || element.start_line > element.end_line
            || element.end_line > source.line_count()
        {
            return Err(Error::StoreIntegrity(format!(
                "element {} in {} has span {}..{} outside 1..{}",
                element.name,
                path,
                element.start_line,
                element.end_line,
                source.line_count()
            )));
        }
        let derived = source
            .slice_lines(element.start_line, element.end_line)
            .unwrap_or_default();
        if derived != element.snippet {
            return Err(Error::StoreIntegrity(format!(
                "element {} in {} has a snippet that does not re-derive from lines {}..{}",
                element.name, path, element.start_line, element.end_line
            )));
        }
    }
    Ok(())
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub repositories: usize,
    pub files: usize,
    pub elements: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  Repositories: {}", self.repositories)?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Elements: {}", self.elements)
    }
}

//! Database schema definitions
//!
//! Three normalized tables: repositories own files, files own elements.
//! Deletes cascade downward so removing a repository can never leave
//! orphaned element rows.

/// SQL to create the repositories table
pub const CREATE_REPOSITORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    origin TEXT NOT NULL,
    last_indexed_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

/// SQL to create the files table
pub const CREATE_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    relative_path TEXT NOT NULL,
    language TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ok',
    last_scanned_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (repository_id, relative_path)
)
"#;

/// SQL to create the elements table
pub const CREATE_ELEMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS elements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    kind TEXT NOT NULL,
    name TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    snippet TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_files_repository ON files(repository_id)",
    "CREATE INDEX IF NOT EXISTS idx_elements_file ON elements(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_elements_name ON elements(name)",
    "CREATE INDEX IF NOT EXISTS idx_elements_kind ON elements(kind)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_REPOSITORIES_TABLE,
        CREATE_FILES_TABLE,
        CREATE_ELEMENTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

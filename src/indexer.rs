//! Indexing orchestration
//!
//! Drives the write path: source reader -> language adapter -> element
//! extractor -> knowledge store. Extraction runs in parallel across files;
//! all store writes funnel through the calling thread, so writes for any
//! (repository, path) key are serialized by construction and each file's
//! replace is a single transaction.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::adapter::{default_registry, AdapterRegistry, DialectOptions, Extraction, ParseStatus};
use crate::source::{detect_language, SourceText};
use crate::store::KnowledgeStore;
use crate::Result;

/// Result of indexing one file
#[derive(Debug, Clone, Copy)]
pub struct IndexOutcome {
    pub elements_count: usize,
    pub status: ParseStatus,
}

/// One file handed to the batch indexer by the repository scanner
#[derive(Debug)]
pub struct FileInput {
    /// Path relative to the repository root
    pub relative_path: String,
    /// Raw file bytes; invalid UTF-8 is replaced, not fatal
    pub content: Vec<u8>,
    /// Language declared by the caller; sniffed from the extension when None
    pub language: Option<String>,
}

/// Options for a batch indexing run
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Re-index files even when their content hash is unchanged
    pub force: bool,
    /// Dialect options forwarded to adapters
    pub dialect: DialectOptions,
}

/// Summary of a batch indexing run.
///
/// Degraded and unsupported files are listed with their specific reason,
/// never silently merged into "0 elements found".
#[derive(Debug, Default)]
pub struct IndexSummary {
    /// Files whose elements were (re)written
    pub indexed: usize,
    /// Files skipped because their content hash was unchanged
    pub skipped: usize,
    /// Total elements written in this run
    pub elements: usize,
    /// (path, reason) for files indexed with partial or zero elements
    pub degraded: Vec<(String, String)>,
    /// (path, reason) for files no adapter could handle
    pub unsupported: Vec<(String, String)>,
    /// (path, reason) for files whose store write was rejected
    pub failed: Vec<(String, String)>,
    /// True when the run was aborted between files
    pub cancelled: bool,
}

impl std::fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "indexed {} file(s) ({} elements), skipped {}, degraded {}, unsupported {}, failed {}{}",
            self.indexed,
            self.elements,
            self.skipped,
            self.degraded.len(),
            self.unsupported.len(),
            self.failed.len(),
            if self.cancelled { ", cancelled" } else { "" }
        )
    }
}

/// Message sent from parallel extraction workers to the writing coordinator
enum IndexMessage {
    Extracted {
        relative_path: String,
        language: String,
        content: String,
        hash: String,
        extraction: Extraction,
    },
    Skipped,
}

/// Orchestrates indexing against a knowledge store
pub struct Indexer {
    registry: AdapterRegistry,
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Indexer {
    /// Create an indexer with all built-in adapters
    pub fn new() -> Self {
        Self {
            registry: default_registry(),
        }
    }

    /// Create an indexer with a custom adapter registry
    pub fn with_registry(registry: AdapterRegistry) -> Self {
        Self { registry }
    }

    /// Index a single file: extract elements and atomically replace the
    /// file's records in the store.
    pub fn index_file(
        &self,
        store: &mut KnowledgeStore,
        repository_id: i64,
        relative_path: &str,
        content_bytes: &[u8],
        declared_language: Option<&str>,
    ) -> Result<IndexOutcome> {
        let source = SourceText::from_bytes(content_bytes);
        let language = declared_language
            .map(str::to_string)
            .unwrap_or_else(|| detect_language(Path::new(relative_path)).to_string());
        let hash = blake3::hash(content_bytes).to_hex().to_string();

        let extraction = self.registry.extract_file(
            Path::new(relative_path),
            &source,
            &DialectOptions::default(),
        );

        let outcome = IndexOutcome {
            elements_count: extraction.elements.len(),
            status: extraction.status,
        };
        store.replace_file_elements(
            repository_id,
            relative_path,
            source.text(),
            &language,
            &hash,
            extraction.status,
            &extraction.elements,
        )?;

        tracing::debug!(
            "indexed {} ({} elements, {})",
            relative_path,
            outcome.elements_count,
            outcome.status
        );
        Ok(outcome)
    }

    /// Index a batch of files with parallel extraction.
    ///
    /// Extraction has no cross-file dependency, so files are spread over
    /// worker threads; this thread commits results one file at a time. The
    /// cancel flag is honored between files: files already committed keep
    /// their new state, no file is ever left half-replaced.
    pub fn index_batch(
        &self,
        store: &mut KnowledgeStore,
        repository_id: i64,
        files: Vec<FileInput>,
        options: &IndexOptions,
        cancel: &AtomicBool,
    ) -> Result<IndexSummary> {
        let known_hashes = store.file_hashes(repository_id)?;
        let mut summary = IndexSummary::default();

        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(files.len().max(1));

        // Round-robin the inputs across workers
        let mut buckets: Vec<Vec<FileInput>> = (0..workers).map(|_| Vec::new()).collect();
        for (idx, file) in files.into_iter().enumerate() {
            buckets[idx % workers].push(file);
        }

        let (tx, rx) = crossbeam::channel::unbounded::<IndexMessage>();

        std::thread::scope(|scope| {
            for bucket in buckets {
                let tx = tx.clone();
                let registry = &self.registry;
                let known_hashes = &known_hashes;
                scope.spawn(move || {
                    for file in bucket {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        let hash = blake3::hash(&file.content).to_hex().to_string();
                        if !options.force
                            && known_hashes.get(&file.relative_path) == Some(&hash)
                        {
                            let _ = tx.send(IndexMessage::Skipped);
                            continue;
                        }

                        let source = SourceText::from_bytes(&file.content);
                        let language = file.language.clone().unwrap_or_else(|| {
                            detect_language(Path::new(&file.relative_path)).to_string()
                        });
                        let extraction = registry.extract_file(
                            Path::new(&file.relative_path),
                            &source,
                            &options.dialect,
                        );
                        let _ = tx.send(IndexMessage::Extracted {
                            relative_path: file.relative_path,
                            language,
                            content: source.text().to_string(),
                            hash,
                            extraction,
                        });
                    }
                });
            }
            drop(tx);

            // Single writer: per-path serialization holds by construction
            for message in rx {
                match message {
                    IndexMessage::Skipped => summary.skipped += 1,
                    IndexMessage::Extracted {
                        relative_path,
                        language,
                        content,
                        hash,
                        extraction,
                    } => {
                        if cancel.load(Ordering::Relaxed) {
                            summary.cancelled = true;
                            continue;
                        }
                        let reason = extraction
                            .reason
                            .clone()
                            .unwrap_or_else(|| "unknown".to_string());
                        match store.replace_file_elements(
                            repository_id,
                            &relative_path,
                            &content,
                            &language,
                            &hash,
                            extraction.status,
                            &extraction.elements,
                        ) {
                            Ok(()) => {
                                summary.indexed += 1;
                                summary.elements += extraction.elements.len();
                                match extraction.status {
                                    ParseStatus::Ok => {}
                                    ParseStatus::Degraded => {
                                        summary.degraded.push((relative_path, reason));
                                    }
                                    ParseStatus::Unsupported => {
                                        summary.unsupported.push((relative_path, reason));
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::warn!("failed to store {}: {}", relative_path, e);
                                summary.failed.push((relative_path, e.to_string()));
                            }
                        }
                    }
                }
            }
        });

        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
        }

        // Reproducible summaries regardless of worker interleaving
        summary.degraded.sort();
        summary.unsupported.sort();
        summary.failed.sort();

        tracing::info!("{}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str, content: &str) -> FileInput {
        FileInput {
            relative_path: path.to_string(),
            content: content.as_bytes().to_vec(),
            language: None,
        }
    }

    #[test]
    fn test_index_file_roundtrip() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/src/app").unwrap();
        let indexer = Indexer::new();

        let outcome = indexer
            .index_file(&mut store, repo, "lib.js", b"function f() {}\nclass C {}\n", None)
            .unwrap();

        assert_eq!(outcome.status, ParseStatus::Ok);
        assert_eq!(outcome.elements_count, 2);
        assert_eq!(store.elements_in_file(repo, "lib.js").unwrap().len(), 2);
    }

    #[test]
    fn test_indexing_is_idempotent() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/src/app").unwrap();
        let indexer = Indexer::new();

        let content = b"const f = () => {\n  return 1;\n};\nfunction g() {}\n";
        indexer.index_file(&mut store, repo, "a.js", content, None).unwrap();
        let first = store.elements_in_file(repo, "a.js").unwrap();

        indexer.index_file(&mut store, repo, "a.js", content, None).unwrap();
        let second = store.elements_in_file(repo, "a.js").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_declared_language_overrides_sniffing() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/").unwrap();
        let indexer = Indexer::new();

        indexer
            .index_file(&mut store, repo, "script.py", b"def f():\n    pass\n", Some("python"))
            .unwrap();
        let elements = store.elements_in_file(repo, "script.py").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].name, "f");
    }

    #[test]
    fn test_batch_mixed_statuses() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/").unwrap();
        let indexer = Indexer::new();

        let files = vec![
            input("good.js", "function ok() {}\n"),
            input("broken.js", "function broken( {\n"),
            input("notes.txt", "plain prose, no definitions\n"),
        ];
        let summary = indexer
            .index_batch(&mut store, repo, files, &IndexOptions::default(), &AtomicBool::new(false))
            .unwrap();

        assert_eq!(summary.indexed, 3);
        assert!(!summary.cancelled);
        assert_eq!(summary.degraded.len(), 1);
        assert_eq!(summary.degraded[0].0, "broken.js");
        assert_eq!(summary.unsupported.len(), 1);
        assert_eq!(summary.unsupported[0].0, "notes.txt");
        assert_eq!(
            store.file_status(repo, "notes.txt").unwrap(),
            Some(ParseStatus::Unsupported)
        );

        // The malformed file did not block its siblings
        assert_eq!(store.elements_in_file(repo, "good.js").unwrap().len(), 1);
    }

    #[test]
    fn test_batch_skips_unchanged() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/").unwrap();
        let indexer = Indexer::new();
        let cancel = AtomicBool::new(false);

        let make_files = || vec![input("a.js", "function a() {}\n"), input("b.js", "function b() {}\n")];

        let first = indexer
            .index_batch(&mut store, repo, make_files(), &IndexOptions::default(), &cancel)
            .unwrap();
        assert_eq!(first.indexed, 2);

        let second = indexer
            .index_batch(&mut store, repo, make_files(), &IndexOptions::default(), &cancel)
            .unwrap();
        assert_eq!(second.indexed, 0);
        assert_eq!(second.skipped, 2);

        let forced = indexer
            .index_batch(
                &mut store,
                repo,
                make_files(),
                &IndexOptions { force: true, ..Default::default() },
                &cancel,
            )
            .unwrap();
        assert_eq!(forced.indexed, 2);
    }

    #[test]
    fn test_cancelled_batch_keeps_committed_files() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/").unwrap();
        let indexer = Indexer::new();

        let cancel = AtomicBool::new(true);
        let summary = indexer
            .index_batch(
                &mut store,
                repo,
                vec![input("a.js", "function a() {}\n")],
                &IndexOptions::default(),
                &cancel,
            )
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.indexed, 0);
    }

    #[test]
    fn test_span_invariant_holds_for_indexed_elements() {
        let mut store = KnowledgeStore::open_in_memory().unwrap();
        let repo = store.upsert_repository("app", "/").unwrap();
        let indexer = Indexer::new();

        let content = "class A {\n}\nconst f = function () {\n  return 2;\n};\n";
        indexer
            .index_file(&mut store, repo, "mix.js", content.as_bytes(), None)
            .unwrap();

        let text = SourceText::new(content);
        for element in store.elements_in_file(repo, "mix.js").unwrap() {
            assert!(element.start_line >= 1);
            assert!(element.start_line <= element.end_line);
            assert!(element.end_line <= text.line_count());
            assert_eq!(
                element.snippet,
                text.slice_lines(element.start_line, element.end_line).unwrap()
            );
        }
    }
}

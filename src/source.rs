//! Source reading - line-addressable view over file text
//!
//! Snippets are always re-sliced from the original text at line bounds, so
//! downstream transfer/documentation consumers see formatting verbatim.

use std::path::Path;

/// A file's text split into line-addressable form.
///
/// Lines are split on `\n` only; a trailing newline does not count as an
/// extra line. Carriage returns are preserved so snippets stay byte-faithful.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
}

impl SourceText {
    /// Wrap raw file text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Build from raw bytes, replacing invalid UTF-8 sequences
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(String::from_utf8_lossy(bytes).into_owned())
    }

    /// The full text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines in the file
    pub fn line_count(&self) -> u32 {
        if self.text.is_empty() {
            return 0;
        }
        let mut count = self.text.split('\n').count();
        if self.text.ends_with('\n') {
            count -= 1;
        }
        count as u32
    }

    /// Slice the inclusive 1-based line range `[start, end]`, newline-joined.
    ///
    /// Returns `None` when the range is out of bounds or inverted.
    pub fn slice_lines(&self, start: u32, end: u32) -> Option<String> {
        if start < 1 || end < start || end > self.line_count() {
            return None;
        }
        let lines: Vec<&str> = self
            .text
            .split('\n')
            .skip(start as usize - 1)
            .take((end - start + 1) as usize)
            .collect();
        Some(lines.join("\n"))
    }

    /// Clamp a 1-based line number into `[1, line_count]`
    pub fn clamp_line(&self, line: u32) -> u32 {
        line.max(1).min(self.line_count().max(1))
    }
}

/// Detect a language tag from a file extension.
///
/// Unknown extensions map to `"text"` so the file is still recorded.
pub fn detect_language(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "py" | "pyi" => "python",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "c" => "c",
        "h" => "c_header",
        "cpp" | "cc" | "cxx" => "cpp",
        "hpp" => "cpp_header",
        "cs" => "csharp",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "rs" => "rust",
        "kt" => "kotlin",
        "swift" => "swift",
        "md" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "html" => "html",
        "css" => "css",
        _ => "text",
    }
}

/// The `_<family>` suffix used on element kind tags when this language
/// shares the store with the default (JS/TS) family.
pub fn language_family_suffix(language: &str) -> Option<&'static str> {
    match language {
        "python" => Some("py"),
        _ => None,
    }
}

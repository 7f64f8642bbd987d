//! JSONL source parsing.
//!
//! Each line of a `.jsonl` file becomes one flattened document; malformed
//! lines are logged and skipped, never aborting the file.

use std::path::Path;

use serde_json::Value;

use crate::core::errors::ApiError;

use super::flatten::{flatten, render};

/// One parsed source document, ready for chunking.
#[derive(Debug, Clone)]
pub struct IngestDocument {
    /// `path: value` lines from the flattened JSON object.
    pub content: String,
    /// Name of the file the line came from.
    pub source: String,
}

/// Outcome of parsing one file.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub documents: Vec<IngestDocument>,
    pub lines_skipped: usize,
}

/// Parse a JSONL file into flattened documents.
///
/// Fails only when the file itself cannot be read; bad lines inside it are
/// counted and skipped with a warning.
pub fn parse_jsonl(path: &Path) -> Result<ParsedFile, ApiError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let contents = std::fs::read_to_string(path).map_err(ApiError::internal)?;

    let mut parsed = ParsedFile::default();
    for (line_no, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    "Skipping line {} in {} due to error: {}",
                    line_no + 1,
                    file_name,
                    err
                );
                parsed.lines_skipped += 1;
                continue;
            }
        };

        let content = render(&flatten(&value));
        if content.trim().is_empty() {
            continue;
        }

        parsed.documents.push(IngestDocument {
            content,
            source: file_name.clone(),
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".jsonl")
            .tempfile()
            .unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn parses_valid_lines_into_flattened_documents() {
        let file = write_fixture(&[
            r#"{"name": "Gate", "specs": {"width": 4}}"#,
            r#"{"name": "Fence"}"#,
        ]);

        let parsed = parse_jsonl(file.path()).unwrap();
        assert_eq!(parsed.documents.len(), 2);
        assert_eq!(parsed.lines_skipped, 0);
        assert_eq!(parsed.documents[0].content, "name: Gate\nspecs.width: 4");
    }

    #[test]
    fn malformed_lines_are_skipped_and_counted() {
        let file = write_fixture(&[
            r#"{"ok": 1}"#,
            "not json at all",
            r#"{"ok": 2}"#,
        ]);

        let parsed = parse_jsonl(file.path()).unwrap();
        assert_eq!(parsed.documents.len(), 2);
        assert_eq!(parsed.lines_skipped, 1);
    }

    #[test]
    fn blank_lines_are_ignored_silently() {
        let file = write_fixture(&[r#"{"ok": 1}"#, "", "   "]);

        let parsed = parse_jsonl(file.path()).unwrap();
        assert_eq!(parsed.documents.len(), 1);
        assert_eq!(parsed.lines_skipped, 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = parse_jsonl(Path::new("/nonexistent/data.jsonl"));
        assert!(result.is_err());
    }
}

//! Row sources and metadata about the file they came from.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered rows of cell strings, addressed by 1-based index.
pub trait RowSource {
    /// Number of rows in the source.
    fn total_rows(&self) -> usize;

    /// Cells of a row, or `None` past the end. Rows are 1-based.
    fn row(&self, index: usize) -> Option<&[String]>;

    /// Text of a row as it would appear in the file.
    fn raw_line(&self, index: usize) -> String {
        self.row(index).map(|cells| cells.join(",")).unwrap_or_default()
    }
}

impl RowSource for Vec<Vec<String>> {
    fn total_rows(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> Option<&[String]> {
        index.checked_sub(1).and_then(|i| self.get(i)).map(|r| r.as_slice())
    }
}

/// Metadata about the source data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Detected encoding.
    pub encoding: String,
    /// Number of rows, blank lines included.
    pub row_count: usize,
    /// Widest row.
    pub column_count: usize,
    /// When the file was read.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        encoding: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            encoding,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// A delimited file read into memory, rows kept exactly as found (no
/// padding or truncation, blank lines preserved as empty rows).
#[derive(Debug, Clone)]
pub struct TabularFile {
    /// Row cells, row-major.
    pub rows: Vec<Vec<String>>,
    /// The delimiter used.
    pub delimiter: u8,
    /// Where the rows came from.
    pub metadata: SourceMetadata,
}

impl RowSource for TabularFile {
    fn total_rows(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.row(index)
    }

    fn raw_line(&self, index: usize) -> String {
        self.row(index)
            .map(|cells| cells.join(&(self.delimiter as char).to_string()))
            .unwrap_or_default()
    }
}

/// Check if a value represents a missing/null value.
pub fn is_null_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Returns true if every cell of a row is blank.
pub fn is_blank_row(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_row_source_is_one_based() {
        let rows = vec![vec!["a".to_string()], vec!["b".to_string()]];
        assert_eq!(rows.total_rows(), 2);
        assert_eq!(rows.row(0), None);
        assert_eq!(rows.row(1), Some(&["a".to_string()][..]));
        assert_eq!(rows.row(3), None);
    }

    #[test]
    fn test_is_null_value() {
        assert!(is_null_value(""));
        assert!(is_null_value("NA"));
        assert!(is_null_value("n/a"));
        assert!(is_null_value("-"));
        assert!(!is_null_value("0"));
        assert!(!is_null_value("Spray"));
    }

    #[test]
    fn test_is_blank_row() {
        assert!(is_blank_row(&[]));
        assert!(is_blank_row(&[" ".to_string(), String::new()]));
        assert!(!is_blank_row(&["x".to_string()]));
    }
}

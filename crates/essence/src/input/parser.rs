//! CSV/TSV reader with delimiter detection.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{SourceMetadata, TabularFile};
use crate::error::{EssenceError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Reads delimited catalog files into [`TabularFile`]s.
///
/// Catalog exports have no reliable header, so every line is a row; the
/// file schema decides which rows are titles or data.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read and parse a file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<TabularFile> {
        let path = path.as_ref();
        let io_err = |e| EssenceError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = File::open(path).map_err(io_err)?;
        let size_bytes = file.metadata().map_err(io_err)?.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(io_err)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let body = contents.strip_prefix(UTF8_BOM).unwrap_or(&contents);

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(body)?,
        };

        let encoding = if std::str::from_utf8(body).is_ok() {
            "utf-8"
        } else {
            "latin-1"
        };

        let rows = self.parse_bytes(body, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        };

        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format.to_string(),
            encoding.to_string(),
            rows.len(),
            column_count,
        );

        debug!(
            file = %metadata.file,
            format = %metadata.format,
            rows = metadata.row_count,
            "read source file"
        );

        Ok(TabularFile {
            rows,
            delimiter,
            metadata,
        })
    }

    /// Parse bytes into rows of cells.
    ///
    /// Rows are kept as found: no padding or truncation, and blank lines
    /// (which the csv reader skips) come back as empty rows so row indices
    /// stay aligned with the file.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Vec<Vec<String>>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut next_line: u64 = 1;

        for result in reader.byte_records() {
            if let Some(max) = self.config.max_rows {
                if rows.len() >= max {
                    break;
                }
            }

            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(next_line);
            while next_line < line && self.config.max_rows.is_none_or(|max| rows.len() < max) {
                rows.push(Vec::new());
                next_line += 1;
            }
            if self.config.max_rows.is_some_and(|max| rows.len() >= max) {
                break;
            }

            let embedded_newlines = record
                .iter()
                .map(|field| field.iter().filter(|&&b| b == b'\n').count() as u64)
                .sum::<u64>();
            next_line = line + 1 + embedded_newlines;

            rows.push(record.iter().map(decode_cell).collect());
        }

        if rows.is_empty() {
            return Err(EssenceError::EmptyData("No rows found".to_string()));
        }

        Ok(rows)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a cell as UTF-8, falling back to Latin-1.
fn decode_cell(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Sniff the delimiter from the first non-blank lines.
///
/// Candidates rank by how steady their per-line count is, then by the count
/// itself; tab wins ties. Text with none of them falls back to comma.
pub fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let lines: Vec<String> = bytes
        .split(|&b| b == b'\n')
        .map(decode_cell)
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();

    if lines.is_empty() {
        return Err(EssenceError::EmptyData("No lines to analyze".to_string()));
    }

    // Reversed so that earlier delimiters win exact ties under max_by_key.
    let best = DELIMITERS
        .iter()
        .rev()
        .filter_map(|&delim| {
            let counts: Vec<usize> = lines.iter().map(|l| unquoted_count(l, delim)).collect();
            let first = counts[0];
            (first > 0).then(|| ((steadiness(&counts), first, delim == b'\t'), delim))
        })
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, delim)| delim)
        .unwrap_or(b',');

    Ok(best)
}

/// 2 when every line agrees, 1 when counts barely wander, 0 otherwise.
fn steadiness(counts: &[usize]) -> u8 {
    let first = counts[0];
    if counts.iter().all(|&c| c == first) {
        return 2;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    let variance = counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / n;
    u8::from(variance < 1.0)
}

/// Occurrences of `delimiter` outside double quotes.
fn unquoted_count(line: &str, delimiter: u8) -> usize {
    let target = delimiter as char;
    line.chars()
        .scan(false, |quoted, ch| {
            if ch == '"' {
                *quoted = !*quoted;
            }
            Some(ch == target && !*quoted)
        })
        .filter(|&hit| hit)
        .count()
}

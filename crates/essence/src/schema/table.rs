//! File-level schema: which rows hold data and where each column goes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{EssenceError, Result};

use super::column::ColumnTarget;

/// Layout of a tabular catalog file.
///
/// Row numbers are 1-based, column indices are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSchema {
    /// Row holding the column titles, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_row: Option<usize>,

    /// First row to convert.
    #[serde(default = "default_first_data_row")]
    pub first_data_row: usize,

    /// Last row to convert; `None` (or `-1` in JSON) means end of file.
    #[serde(default, with = "row_bound")]
    pub last_data_row: Option<usize>,

    /// Whether title rows repeat inside the data (page breaks in exports).
    #[serde(default)]
    pub recurring_titles: bool,

    /// Expected cell count of a data row. Defaults to the title row width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_columns: Option<usize>,

    /// Column index to record field.
    #[serde(default)]
    pub columns: IndexMap<usize, ColumnTarget>,

    /// Columns whose text also goes through description analysis.
    #[serde(default)]
    pub description_columns: Vec<usize>,
}

fn default_first_data_row() -> usize {
    1
}

impl FileSchema {
    /// Create a schema converting every row, with no mapped columns.
    pub fn new() -> Self {
        Self {
            title_row: None,
            first_data_row: 1,
            last_data_row: None,
            recurring_titles: false,
            expected_columns: None,
            columns: IndexMap::new(),
            description_columns: Vec::new(),
        }
    }

    /// Declare the title row; data then starts on the following row.
    pub fn with_title_row(mut self, row: usize) -> Self {
        self.title_row = Some(row);
        if self.first_data_row <= row {
            self.first_data_row = row + 1;
        }
        self
    }

    /// Restrict conversion to a row range.
    pub fn with_data_rows(mut self, first: usize, last: Option<usize>) -> Self {
        self.first_data_row = first;
        self.last_data_row = last;
        self
    }

    /// Skip interior title rows.
    pub fn with_recurring_titles(mut self) -> Self {
        self.recurring_titles = true;
        self
    }

    /// Set the expected cell count explicitly.
    pub fn with_expected_columns(mut self, count: usize) -> Self {
        self.expected_columns = Some(count);
        self
    }

    /// Map a column onto a record field.
    pub fn map_column(mut self, index: usize, target: ColumnTarget) -> Self {
        self.columns.insert(index, target);
        self
    }

    /// Feed a column into description analysis.
    pub fn describe_column(mut self, index: usize) -> Self {
        if !self.description_columns.contains(&index) {
            self.description_columns.push(index);
        }
        self
    }

    /// Expected cell count given the title row cells, if known.
    pub fn expected_column_count(&self, title: Option<&[String]>) -> Option<usize> {
        self.expected_columns.or_else(|| title.map(|t| t.len()))
    }

    /// Check the schema for inconsistencies.
    pub fn validate(&self) -> Result<()> {
        if self.first_data_row == 0 {
            return Err(EssenceError::Config(
                "first_data_row is 1-based and must be at least 1".to_string(),
            ));
        }
        if let Some(last) = self.last_data_row {
            if last < self.first_data_row {
                return Err(EssenceError::Config(format!(
                    "last_data_row {} precedes first_data_row {}",
                    last, self.first_data_row
                )));
            }
        }
        if self.title_row == Some(0) {
            return Err(EssenceError::Config("title_row is 1-based".to_string()));
        }
        if self.columns.is_empty() && self.description_columns.is_empty() {
            return Err(EssenceError::Config(
                "schema maps no columns and analyzes no description".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a schema from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EssenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let schema: FileSchema = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            EssenceError::Config(format!(
                "Failed to parse file schema '{}': {}",
                path.display(),
                e
            ))
        })?;
        schema.validate()?;
        Ok(schema)
    }
}

impl Default for FileSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Serde adapter for an optional 1-based row bound where `-1` means
/// "until the end of the file".
mod row_bound {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(row) => serializer.serialize_u64(*row as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        match raw {
            None | Some(-1) => Ok(None),
            Some(row) if row >= 1 => Ok(Some(row as usize)),
            Some(row) => Err(serde::de::Error::custom(format!(
                "invalid row bound {}: use a 1-based row or -1",
                row
            ))),
        }
    }
}

//! Conversion results and summary statistics.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::EssenceError;
use crate::input::SourceMetadata;
use crate::interactive::LearningFailure;
use crate::record::{FieldProblem, ProductRecord};
use crate::schema::AttributeKind;

/// Why a row produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// The row was blank.
    Empty,
    /// Processing the row failed.
    Row,
    /// The record was built but is incomplete.
    Validation,
}

impl IssueKind {
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::Empty => "empty",
            IssueKind::Row => "row error",
            IssueKind::Validation => "validation",
        }
    }
}

/// A problem attached to one source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    /// Source row (1-based).
    pub row: usize,
    /// Record field concerned, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    /// The row's text as it appeared in the file.
    pub raw_line: String,
    pub kind: IssueKind,
}

impl RowIssue {
    pub fn empty(row: usize, raw_line: impl Into<String>) -> Self {
        Self {
            row,
            field: None,
            message: "empty row".to_string(),
            raw_line: raw_line.into(),
            kind: IssueKind::Empty,
        }
    }

    pub fn from_error(row: usize, error: &EssenceError, raw_line: impl Into<String>) -> Self {
        let (field, message) = match error {
            EssenceError::Mapping { field, message } => (Some(field.clone()), message.clone()),
            other => (None, other.to_string()),
        };
        Self {
            row,
            field,
            message,
            raw_line: raw_line.into(),
            kind: IssueKind::Row,
        }
    }

    pub fn from_problem(row: usize, problem: &FieldProblem, raw_line: impl Into<String>) -> Self {
        Self {
            row,
            field: Some(problem.field.to_string()),
            message: problem.message.clone(),
            raw_line: raw_line.into(),
            kind: IssueKind::Validation,
        }
    }
}

/// Outcome of converting one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Rows visited in the data range, blank and title rows included.
    pub lines_processed: usize,
    pub empty_lines: usize,
    /// Interior title rows skipped without an issue.
    pub skipped_title_rows: usize,
    /// Records that passed validation.
    pub records: Vec<ProductRecord>,
    pub errors: Vec<RowIssue>,
    /// Fields decided by a resolver (including explicit clears).
    pub interactive_decision_count: usize,
    /// Teaching statements applied.
    pub learned_rule_count: usize,
    pub learning_failures: Vec<LearningFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// How many records carry an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub count: usize,
    /// Share of records, 0.0 to 1.0.
    pub ratio: f64,
}

/// Summary statistics of a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub lines_processed: usize,
    pub records: usize,
    /// Distinct rows with at least one issue.
    pub rows_with_issues: usize,
    pub issues_by_kind: IndexMap<String, usize>,
    /// Per-attribute coverage, in attribute order.
    pub coverage: IndexMap<String, Coverage>,
    pub interactive_decisions: usize,
    pub learned_rules: usize,
}

impl ConversionResult {
    /// Start an empty result stamped with the current time.
    pub fn new() -> Self {
        Self {
            lines_processed: 0,
            empty_lines: 0,
            skipped_title_rows: 0,
            records: Vec::new(),
            errors: Vec::new(),
            interactive_decision_count: 0,
            learned_rule_count: 0,
            learning_failures: Vec::new(),
            source: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Issues of one kind.
    pub fn issues(&self, kind: IssueKind) -> impl Iterator<Item = &RowIssue> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    pub fn summary(&self) -> ConversionSummary {
        let total = self.records.len();

        let mut coverage = IndexMap::new();
        for kind in AttributeKind::ALL {
            let count = self.records.iter().filter(|r| r.is_set(kind)).count();
            let ratio = if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            };
            coverage.insert(kind.label().to_string(), Coverage { count, ratio });
        }

        let mut issues_by_kind = IndexMap::new();
        for issue in &self.errors {
            *issues_by_kind
                .entry(issue.kind.label().to_string())
                .or_insert(0) += 1;
        }

        let mut rows: Vec<usize> = self.errors.iter().map(|e| e.row).collect();
        rows.sort_unstable();
        rows.dedup();

        ConversionSummary {
            lines_processed: self.lines_processed,
            records: total,
            rows_with_issues: rows.len(),
            issues_by_kind,
            coverage,
            interactive_decisions: self.interactive_decision_count,
            learned_rules: self.learned_rule_count,
        }
    }
}

impl Default for ConversionResult {
    fn default() -> Self {
        Self::new()
    }
}

//! The resolver protocol consulted when an extraction is not trustworthy.

use serde::{Deserialize, Serialize};

use crate::record::ProductRecord;
use crate::schema::{AttributeKind, Concentration, SizeUnit};

/// Confidence below which a resolver is consulted, unless it says otherwise.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// A resolver's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "answer", content = "value", rename_all = "snake_case")]
pub enum Answer<T> {
    /// Use this value.
    Use(T),
    /// Explicitly none: leave the field empty.
    Clear,
    /// No answer: keep the deterministic result.
    Skip,
}

impl<T> Answer<T> {
    /// Returns true for `Use` and `Clear`, which count as operator decisions.
    pub fn is_decision(&self) -> bool {
        !matches!(self, Answer::Skip)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Answer<U> {
        match self {
            Answer::Use(v) => Answer::Use(f(v)),
            Answer::Clear => Answer::Clear,
            Answer::Skip => Answer::Skip,
        }
    }
}

/// Everything a resolver may want to know about one decision point.
#[derive(Debug, Clone, Copy)]
pub struct InteractiveContext<'a> {
    /// Source row (1-based).
    pub row_number: usize,
    /// Attribute under decision.
    pub attribute: AttributeKind,
    /// Record field name, as used in row issues.
    pub field_name: &'static str,
    /// Description text being analyzed.
    pub original_text: &'a str,
    /// The record as built so far.
    pub record: &'a ProductRecord,
    /// Confidence of the deterministic result, 0.0 to 1.0.
    pub confidence: f64,
    /// The whole row as it appeared in the file.
    pub raw_row_text: &'a str,
}

/// Decision points of an interactive conversion.
///
/// Each call blocks until answered. Implementations decide only; the
/// converter applies answers and persists learned rules.
pub trait InteractiveResolver {
    /// Pick a brand id.
    fn resolve_brand(&mut self, context: &InteractiveContext<'_>, candidates: &[u32]) -> Answer<u32>;

    /// Pick a concentration.
    fn resolve_concentration(
        &mut self,
        context: &InteractiveContext<'_>,
        candidates: &[Concentration],
    ) -> Answer<Concentration>;

    /// Pick a size. Answers need not come from `candidates`.
    fn resolve_size(
        &mut self,
        context: &InteractiveContext<'_>,
        candidates: &[(String, SizeUnit)],
    ) -> Answer<(String, SizeUnit)>;

    /// Pick one of `options` by index.
    fn resolve_general(
        &mut self,
        context: &InteractiveContext<'_>,
        question: &str,
        options: &[String],
    ) -> Answer<usize>;

    /// Whether to learn something from this text.
    fn should_learn(
        &mut self,
        context: &InteractiveContext<'_>,
        original_text: &str,
        detected_summary: &str,
    ) -> bool;

    /// Teaching statements such as `(\d+) CC -> size = ml`.
    fn teaching_statements(&mut self, context: &InteractiveContext<'_>) -> Vec<String>;

    /// Confidence below which this resolver wants to be asked.
    fn confidence_threshold(&self) -> f64 {
        DEFAULT_CONFIDENCE_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_is_decision() {
        assert!(Answer::Use(1).is_decision());
        assert!(Answer::<u32>::Clear.is_decision());
        assert!(!Answer::<u32>::Skip.is_decision());
    }

    #[test]
    fn test_answer_map() {
        assert_eq!(Answer::Use(2).map(|n| n * 10), Answer::Use(20));
        assert_eq!(Answer::<u32>::Clear.map(|n| n * 10), Answer::Clear);
    }
}

//! Automated resolvers for tests and unattended runs.

use std::collections::VecDeque;

use crate::schema::{AttributeKind, Concentration, SizeUnit};

use super::resolver::{Answer, InteractiveContext, InteractiveResolver, DEFAULT_CONFIDENCE_THRESHOLD};

/// Always answers with the first candidate, or skips when there is none.
/// Never learns.
#[derive(Debug, Clone)]
pub struct FirstCandidateResolver {
    threshold: f64,
}

impl FirstCandidateResolver {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Use a different confidence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Default for FirstCandidateResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn first<T: Clone>(candidates: &[T]) -> Answer<T> {
    candidates.first().cloned().map_or(Answer::Skip, Answer::Use)
}

impl InteractiveResolver for FirstCandidateResolver {
    fn resolve_brand(&mut self, _context: &InteractiveContext<'_>, candidates: &[u32]) -> Answer<u32> {
        first(candidates)
    }

    fn resolve_concentration(
        &mut self,
        _context: &InteractiveContext<'_>,
        candidates: &[Concentration],
    ) -> Answer<Concentration> {
        first(candidates)
    }

    fn resolve_size(
        &mut self,
        _context: &InteractiveContext<'_>,
        candidates: &[(String, SizeUnit)],
    ) -> Answer<(String, SizeUnit)> {
        first(candidates)
    }

    fn resolve_general(
        &mut self,
        _context: &InteractiveContext<'_>,
        _question: &str,
        options: &[String],
    ) -> Answer<usize> {
        if options.is_empty() {
            Answer::Skip
        } else {
            Answer::Use(0)
        }
    }

    fn should_learn(&mut self, _context: &InteractiveContext<'_>, _text: &str, _summary: &str) -> bool {
        false
    }

    fn teaching_statements(&mut self, _context: &InteractiveContext<'_>) -> Vec<String> {
        Vec::new()
    }

    fn confidence_threshold(&self) -> f64 {
        self.threshold
    }
}

/// One question the converter asked.
#[derive(Debug, Clone, PartialEq)]
pub struct AskedQuestion {
    pub row_number: usize,
    pub attribute: AttributeKind,
    pub confidence: f64,
}

/// Replays queued answers in order. An exhausted queue answers `Skip`
/// (or "don't learn"). Every question is recorded in [`ScriptedResolver::asked`].
#[derive(Debug, Clone)]
pub struct ScriptedResolver {
    threshold: f64,
    brands: VecDeque<Answer<u32>>,
    concentrations: VecDeque<Answer<Concentration>>,
    sizes: VecDeque<Answer<(String, SizeUnit)>>,
    general: VecDeque<Answer<usize>>,
    lessons: VecDeque<Vec<String>>,
    pub asked: Vec<AskedQuestion>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            brands: VecDeque::new(),
            concentrations: VecDeque::new(),
            sizes: VecDeque::new(),
            general: VecDeque::new(),
            lessons: VecDeque::new(),
            asked: Vec::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn brand(mut self, answer: Answer<u32>) -> Self {
        self.brands.push_back(answer);
        self
    }

    pub fn concentration(mut self, answer: Answer<Concentration>) -> Self {
        self.concentrations.push_back(answer);
        self
    }

    pub fn size(mut self, answer: Answer<(String, SizeUnit)>) -> Self {
        self.sizes.push_back(answer);
        self
    }

    /// Answer for dispenser type, gender and other option lists.
    pub fn general(mut self, answer: Answer<usize>) -> Self {
        self.general.push_back(answer);
        self
    }

    /// Agree to learn once, with these statements.
    pub fn teach<S: Into<String>>(mut self, statements: impl IntoIterator<Item = S>) -> Self {
        self.lessons
            .push_back(statements.into_iter().map(Into::into).collect());
        self
    }

    fn record(&mut self, context: &InteractiveContext<'_>) {
        self.asked.push(AskedQuestion {
            row_number: context.row_number,
            attribute: context.attribute,
            confidence: context.confidence,
        });
    }
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveResolver for ScriptedResolver {
    fn resolve_brand(&mut self, context: &InteractiveContext<'_>, _candidates: &[u32]) -> Answer<u32> {
        self.record(context);
        self.brands.pop_front().unwrap_or(Answer::Skip)
    }

    fn resolve_concentration(
        &mut self,
        context: &InteractiveContext<'_>,
        _candidates: &[Concentration],
    ) -> Answer<Concentration> {
        self.record(context);
        self.concentrations.pop_front().unwrap_or(Answer::Skip)
    }

    fn resolve_size(
        &mut self,
        context: &InteractiveContext<'_>,
        _candidates: &[(String, SizeUnit)],
    ) -> Answer<(String, SizeUnit)> {
        self.record(context);
        self.sizes.pop_front().unwrap_or(Answer::Skip)
    }

    fn resolve_general(
        &mut self,
        context: &InteractiveContext<'_>,
        _question: &str,
        _options: &[String],
    ) -> Answer<usize> {
        self.record(context);
        self.general.pop_front().unwrap_or(Answer::Skip)
    }

    fn should_learn(&mut self, _context: &InteractiveContext<'_>, _text: &str, _summary: &str) -> bool {
        !self.lessons.is_empty()
    }

    fn teaching_statements(&mut self, _context: &InteractiveContext<'_>) -> Vec<String> {
        self.lessons.pop_front().unwrap_or_default()
    }

    fn confidence_threshold(&self) -> f64 {
        self.threshold
    }
}

//! Row-by-row conversion of a catalog file into product records.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::extraction::{CandidateSet, ParsedAttributes, Provenance};
use crate::input::{is_blank_row, is_null_value, Parser, ParserConfig, RowSource};
use crate::interactive::{learn, Answer, InteractiveContext, InteractiveResolver, LearningOutcome};
use crate::record::ProductRecord;
use crate::rules::RuntimeRuleManager;
use crate::schema::{AttributeKind, Concentration, DispenserType, FileSchema, Gender, SizeUnit};

use super::mapping::apply_cell;
use super::result::{ConversionResult, RowIssue};

/// Attributes a resolver can be asked about, in asking order.
const RESOLVABLE: [AttributeKind; 5] = [
    AttributeKind::Brand,
    AttributeKind::Concentration,
    AttributeKind::DispenserType,
    AttributeKind::Gender,
    AttributeKind::Size,
];

/// Confidence of a deterministic extraction that no column mapping set.
///
/// A rule hit beats a dictionary hit; several distinct candidates lower
/// either.
pub fn estimate_confidence(provenance: Option<&Provenance>, candidates: usize) -> f64 {
    let Some(provenance) = provenance else {
        return 0.0;
    };
    match (provenance.is_rule(), candidates <= 1) {
        (true, true) => 0.9,
        (true, false) => 0.6,
        (false, true) => 0.5,
        (false, false) => 0.35,
    }
}

/// A value picked by a resolver, typed for the record field it fills.
enum Resolved {
    Brand(u32),
    Concentration(Concentration),
    DispenserType(DispenserType),
    Gender(Gender),
    Size(String, SizeUnit),
}

/// Resolver outcomes for one row, shared by every text the row feeds into
/// description analysis.
#[derive(Default)]
struct RowDecisions {
    /// Attributes already put to the resolver.
    asked: BTreeSet<AttributeKind>,
    /// Attributes the resolver explicitly cleared.
    cleared: BTreeSet<AttributeKind>,
}

/// Drives rows through column mapping and description analysis.
pub struct RowConverter {
    manager: RuntimeRuleManager,
    parser: Parser,
}

impl RowConverter {
    pub fn new(manager: RuntimeRuleManager) -> Self {
        Self {
            manager,
            parser: Parser::new(),
        }
    }

    /// Open the rule set at `path` (created if absent).
    pub fn open(rules_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(RuntimeRuleManager::open(rules_path)?))
    }

    /// Use a specific parser configuration for input files.
    pub fn with_parser(mut self, config: ParserConfig) -> Self {
        self.parser = Parser::with_config(config);
        self
    }

    pub fn manager(&self) -> &RuntimeRuleManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut RuntimeRuleManager {
        &mut self.manager
    }

    pub fn into_manager(self) -> RuntimeRuleManager {
        self.manager
    }

    /// Convert a file without interaction.
    pub fn convert(&mut self, path: impl AsRef<Path>, schema: &FileSchema) -> Result<ConversionResult> {
        let table = self.parser.parse_file(path)?;
        let mut result = self.convert_source(&table, schema, None)?;
        result.source = Some(table.metadata);
        Ok(result)
    }

    /// Convert a file, consulting `resolver` on low-confidence fields.
    pub fn convert_interactive(
        &mut self,
        path: impl AsRef<Path>,
        schema: &FileSchema,
        resolver: &mut dyn InteractiveResolver,
    ) -> Result<ConversionResult> {
        let table = self.parser.parse_file(path)?;
        let mut result = self.convert_source(&table, schema, Some(resolver))?;
        result.source = Some(table.metadata);
        Ok(result)
    }

    /// Convert any row source.
    ///
    /// Row failures become [`RowIssue`]s and the run continues. Only fatal
    /// errors (an invalid schema, a rule set that cannot be persisted) end
    /// the run.
    pub fn convert_source(
        &mut self,
        source: &dyn RowSource,
        schema: &FileSchema,
        mut resolver: Option<&mut dyn InteractiveResolver>,
    ) -> Result<ConversionResult> {
        schema.validate()?;
        let mut result = ConversionResult::new();

        let title: Option<Vec<String>> = schema
            .title_row
            .and_then(|r| source.row(r))
            .map(|cells| cells.to_vec());
        let expected = schema.expected_column_count(title.as_deref());
        let last = schema
            .last_data_row
            .map_or(source.total_rows(), |l| l.min(source.total_rows()));

        for index in schema.first_data_row..=last {
            let Some(cells) = source.row(index) else {
                break;
            };
            result.lines_processed += 1;
            let raw = source.raw_line(index);

            if is_blank_row(cells) {
                result.empty_lines += 1;
                result.errors.push(RowIssue::empty(index, raw));
                continue;
            }

            if schema.recurring_titles && is_title_row(cells, expected, title.as_deref()) {
                debug!(row = index, "skipping title row");
                result.skipped_title_rows += 1;
                continue;
            }

            match self.convert_row(index, cells, &raw, schema, resolver.as_deref_mut(), &mut result) {
                Ok(record) => {
                    let problems = record.validate();
                    if problems.is_empty() {
                        result.records.push(record);
                    } else {
                        for problem in &problems {
                            result.errors.push(RowIssue::from_problem(index, problem, raw.as_str()));
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(row = index, error = %e, "row failed");
                    result.errors.push(RowIssue::from_error(index, &e, raw));
                }
            }
        }

        result.finished_at = Some(Utc::now());
        info!(
            lines = result.lines_processed,
            records = result.records.len(),
            issues = result.errors.len(),
            decisions = result.interactive_decision_count,
            learned = result.learned_rule_count,
            "conversion finished"
        );
        Ok(result)
    }

    fn convert_row(
        &mut self,
        index: usize,
        cells: &[String],
        raw: &str,
        schema: &FileSchema,
        resolver: Option<&mut (dyn InteractiveResolver + '_)>,
        result: &mut ConversionResult,
    ) -> Result<ProductRecord> {
        let mut record = ProductRecord::new(index, raw);
        let mut texts: Vec<String> = Vec::new();

        for (&column, &target) in &schema.columns {
            let Some(cell) = cells.get(column) else {
                continue;
            };
            if is_null_value(cell) {
                continue;
            }
            if let Some(overflow) = apply_cell(&mut record, target, cell, self.manager.extractor().rules())? {
                texts.push(overflow);
            }
        }

        for &column in &schema.description_columns {
            if let Some(cell) = cells.get(column) {
                if !is_null_value(cell) {
                    texts.push(cell.trim().to_string());
                }
            }
        }

        match resolver {
            Some(resolver) => {
                let mut decisions = RowDecisions::default();
                for text in &texts {
                    self.analyze_interactive(&mut record, text, raw, resolver, &mut decisions, result)?;
                }
                for &kind in &decisions.cleared {
                    record.clear(kind);
                }
            }
            None => {
                for text in &texts {
                    self.manager.extractor().parse_and_apply(&mut record, text, false);
                }
            }
        }

        debug!(row = index, texts = texts.len(), "converted row");
        Ok(record)
    }

    fn analyze_interactive(
        &mut self,
        record: &mut ProductRecord,
        text: &str,
        raw: &str,
        resolver: &mut (dyn InteractiveResolver + '_),
        decisions: &mut RowDecisions,
        result: &mut ConversionResult,
    ) -> Result<()> {
        let threshold = resolver.confidence_threshold();
        let parsed = self.manager.extractor().parse_description(text);
        let candidates = self.manager.extractor().candidates(text);

        let mut unresolved: Vec<(AttributeKind, f64)> = Vec::new();

        for kind in RESOLVABLE {
            if record.is_set(kind) || decisions.asked.contains(&kind) {
                continue;
            }
            let confidence = estimate_confidence(parsed.provenance(kind), candidates.count(kind));
            if confidence >= threshold {
                continue;
            }

            let context = InteractiveContext {
                row_number: record.row_number,
                attribute: kind,
                field_name: field_name(kind),
                original_text: text,
                record,
                confidence,
                raw_row_text: raw,
            };
            let answer = ask(resolver, &context, &candidates);
            decisions.asked.insert(kind);
            if answer.is_decision() {
                result.interactive_decision_count += 1;
                debug!(row = record.row_number, attribute = %kind, "resolver decided");
            }

            match answer {
                Answer::Skip => unresolved.push((kind, confidence)),
                Answer::Clear => {
                    decisions.cleared.insert(kind);
                    if kind == AttributeKind::Size {
                        decisions.cleared.insert(AttributeKind::Unit);
                    }
                }
                Answer::Use(Resolved::Brand(id)) => record.brand_id = Some(id),
                Answer::Use(Resolved::Concentration(c)) => record.concentration = Some(c),
                Answer::Use(Resolved::DispenserType(d)) => record.dispenser_type = Some(d),
                Answer::Use(Resolved::Gender(g)) => record.gender = Some(g),
                Answer::Use(Resolved::Size(size, unit)) => {
                    record.size = Some(size);
                    record.unit = Some(unit);
                }
            }
        }

        apply_except(record, &parsed, &decisions.cleared);

        let Some(&(attribute, confidence)) = unresolved.first() else {
            return Ok(());
        };

        let summary = parsed.summary();
        let context = InteractiveContext {
            row_number: record.row_number,
            attribute,
            field_name: field_name(attribute),
            original_text: text,
            record,
            confidence,
            raw_row_text: raw,
        };
        if !resolver.should_learn(&context, text, &summary) {
            return Ok(());
        }
        let statements = resolver.teaching_statements(&context);

        let mut learned_any = false;
        for statement in &statements {
            match learn(&mut self.manager, statement)? {
                LearningOutcome::Learned(_) => {
                    result.learned_rule_count += 1;
                    learned_any = true;
                }
                LearningOutcome::Failed(failure) => result.learning_failures.push(failure),
            }
        }

        if learned_any {
            let reparsed = self.manager.extractor().parse_description(text);
            apply_except(record, &reparsed, &decisions.cleared);
        }
        Ok(())
    }
}

/// Fill unset fields from `parsed`, keeping cleared fields empty.
fn apply_except(record: &mut ProductRecord, parsed: &ParsedAttributes, cleared: &BTreeSet<AttributeKind>) {
    record.apply(parsed, false);
    for &kind in cleared {
        record.clear(kind);
    }
}

fn ask(
    resolver: &mut (dyn InteractiveResolver + '_),
    context: &InteractiveContext<'_>,
    candidates: &CandidateSet,
) -> Answer<Resolved> {
    match context.attribute {
        AttributeKind::Brand => resolver
            .resolve_brand(context, &candidates.brands)
            .map(Resolved::Brand),
        AttributeKind::Concentration => resolver
            .resolve_concentration(context, &candidates.concentrations)
            .map(Resolved::Concentration),
        AttributeKind::DispenserType => {
            let options: Vec<String> = candidates.dispenser_types.iter().map(|d| d.to_string()).collect();
            let answer = resolver.resolve_general(context, "Which dispenser type?", &options);
            pick_option(answer, &candidates.dispenser_types, Resolved::DispenserType)
        }
        AttributeKind::Gender => {
            let options: Vec<String> = candidates.genders.iter().map(|g| g.to_string()).collect();
            let answer = resolver.resolve_general(context, "Which gender?", &options);
            pick_option(answer, &candidates.genders, Resolved::Gender)
        }
        AttributeKind::Size => {
            let sizes: Vec<(String, SizeUnit)> = candidates
                .sizes
                .iter()
                .filter_map(|(size, unit)| unit.map(|u| (size.clone(), u)))
                .collect();
            resolver
                .resolve_size(context, &sizes)
                .map(|(size, unit)| Resolved::Size(size, unit))
        }
        AttributeKind::Unit | AttributeKind::Name => Answer::Skip,
    }
}

/// Map an option index onto its candidate. An index out of range is a skip.
fn pick_option<T: Copy>(answer: Answer<usize>, options: &[T], wrap: impl Fn(T) -> Resolved) -> Answer<Resolved> {
    match answer.map(|i| options.get(i).copied().map(&wrap)) {
        Answer::Use(Some(value)) => Answer::Use(value),
        Answer::Use(None) | Answer::Skip => Answer::Skip,
        Answer::Clear => Answer::Clear,
    }
}

fn field_name(kind: AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Concentration => "concentration",
        AttributeKind::DispenserType => "dispenser_type",
        AttributeKind::Gender => "gender",
        AttributeKind::Size => "size",
        AttributeKind::Unit => "unit",
        AttributeKind::Brand => "brand_id",
        AttributeKind::Name => "name",
    }
}

/// A row is an interior title row if its width differs from the data width
/// or it repeats the title row.
fn is_title_row(cells: &[String], expected: Option<usize>, title: Option<&[String]>) -> bool {
    if expected.is_some_and(|n| cells.len() != n) {
        return true;
    }
    title.is_some_and(|t| {
        t.len() == cells.len() && t.iter().zip(cells).all(|(a, b)| a.trim().eq_ignore_ascii_case(b.trim()))
    })
}

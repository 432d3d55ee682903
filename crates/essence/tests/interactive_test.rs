//! Integration tests for interactive resolution and runtime teaching.

use std::io::Cursor;
use std::thread;

use tempfile::TempDir;

use essence::interactive::{Question, Reply};
use essence::rules::RuntimeRuleManager;
use essence::{
    Answer, AttributeKind, ChannelResolver, ColumnTarget, ConsoleResolver, FileSchema,
    FirstCandidateResolver, Gender, RowConverter, ScriptedResolver, SizeUnit,
};

const ADP: &str = "ADP BLU MEDITERRANEO MIRTO DI PANAREA 30ML EDT SPRAY 29.6ml";

fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn description_schema() -> FileSchema {
    FileSchema::new()
        .map_column(0, ColumnTarget::Code)
        .describe_column(1)
}

// =============================================================================
// Automated Resolver Tests
// =============================================================================

#[test]
fn test_first_candidate_resolves_ambiguous_size() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = FirstCandidateResolver::new();

    let source = rows(&[&["A1", ADP]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    assert_eq!(result.interactive_decision_count, 1);
    assert_eq!(result.records[0].size.as_deref(), Some("30"));
    assert_eq!(result.records[0].unit, Some(SizeUnit::Ml));
    assert_eq!(result.learned_rule_count, 0);
}

#[test]
fn test_question_order_and_confidence() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = ScriptedResolver::new();

    let source = rows(&[&["A1", ADP]]);
    converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    let asked: Vec<_> = resolver.asked.iter().map(|q| q.attribute).collect();
    assert_eq!(
        asked,
        vec![AttributeKind::Brand, AttributeKind::Gender, AttributeKind::Size]
    );
    assert_eq!(resolver.asked[0].confidence, 0.0);
    assert_eq!(resolver.asked[2].confidence, 0.6);
}

#[test]
fn test_clear_differs_from_skip() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();

    // Per row: brand, concentration, dispenser type (general), gender (general).
    let mut resolver = ScriptedResolver::new()
        .general(Answer::Skip)
        .general(Answer::Clear);

    let source = rows(&[&["A1", "ROSE 50ML UNISEX"], &["A2", "LILY 30ML UNISEX"]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[0].gender, None);
    assert_eq!(result.records[1].gender, Some(Gender::Unisex));
    assert_eq!(result.interactive_decision_count, 1);
}

#[test]
fn test_clear_holds_across_texts_of_a_row() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();

    // Dispenser type skipped, gender cleared. Each is asked once per row.
    let mut resolver = ScriptedResolver::new()
        .general(Answer::Skip)
        .general(Answer::Clear);

    // The code cell overflows into a second description text.
    let source = rows(&[&["A1 ROSE 50ML UNISEX", "ROSE 50ML UNISEX"]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    let asked: Vec<_> = resolver.asked.iter().map(|q| q.attribute).collect();
    assert_eq!(
        asked,
        vec![
            AttributeKind::Brand,
            AttributeKind::Concentration,
            AttributeKind::DispenserType,
            AttributeKind::Gender,
        ]
    );

    let record = &result.records[0];
    assert_eq!(record.code.as_deref(), Some("A1"));
    assert_eq!(record.gender, None);
    assert_eq!(record.size.as_deref(), Some("50"));
    assert_eq!(result.interactive_decision_count, 1);
}

#[test]
fn test_answers_override_detection() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = ScriptedResolver::new()
        .brand(Answer::Use(42))
        .general(Answer::Use(0))
        .size(Answer::Use(("29.6".to_string(), SizeUnit::Ml)));

    let source = rows(&[&["A1", ADP]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    let record = &result.records[0];
    assert_eq!(record.brand_id, Some(42));
    assert_eq!(record.size.as_deref(), Some("29.6"));
    // No gender candidates, so option 0 does not exist and counts as a skip.
    assert_eq!(record.gender, None);
    assert_eq!(result.interactive_decision_count, 2);
}

#[test]
fn test_mapped_fields_are_not_asked() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = ScriptedResolver::new();

    let schema = description_schema()
        .map_column(2, ColumnTarget::Gender)
        .map_column(3, ColumnTarget::Brand);
    let source = rows(&[&["A1", ADP, "Women", "12"]]);
    let result = converter
        .convert_source(&source, &schema, Some(&mut resolver))
        .unwrap();

    assert!(resolver
        .asked
        .iter()
        .all(|q| q.attribute != AttributeKind::Gender && q.attribute != AttributeKind::Brand));
    assert_eq!(result.records[0].brand_id, Some(12));
    assert_eq!(result.records[0].gender, Some(Gender::Female));
}

#[test]
fn test_zero_threshold_asks_nothing() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = ScriptedResolver::new().with_threshold(0.0);

    let source = rows(&[&["A1", ADP]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    assert!(resolver.asked.is_empty());
    assert_eq!(result.interactive_decision_count, 0);
    assert_eq!(result.records[0].size.as_deref(), Some("30"));
}

// =============================================================================
// Teaching Tests
// =============================================================================

#[test]
fn test_teaching_applies_to_current_and_later_rows() {
    let dir = TempDir::new().unwrap();
    let rules_path = dir.path().join("rules.json");
    let mut converter = RowConverter::open(&rules_path).unwrap();
    let mut resolver = ScriptedResolver::new().teach([
        "POUR ELLE -> gender = female",
        r"(\d+)\s*CC -> size = ml",
        "garbage",
    ]);

    let schema = description_schema().map_column(2, ColumnTarget::Name);
    let source = rows(&[
        &["B1", "ROSE POUR ELLE 50 CC", "Rose"],
        &["B2", "LILY 30 CC", "Lily"],
    ]);
    let result = converter
        .convert_source(&source, &schema, Some(&mut resolver))
        .unwrap();

    assert_eq!(result.learned_rule_count, 2);
    assert_eq!(result.learning_failures.len(), 1);
    assert_eq!(result.learning_failures[0].statement, "garbage");

    let first = &result.records[0];
    assert_eq!(first.gender, Some(Gender::Female));
    assert_eq!(first.size.as_deref(), Some("50"));
    assert_eq!(first.unit, Some(SizeUnit::Ml));

    let second = &result.records[1];
    assert_eq!(second.size.as_deref(), Some("30"));
    assert_eq!(second.unit, Some(SizeUnit::Ml));
    assert!(resolver
        .asked
        .iter()
        .all(|q| !(q.row_number == 2 && q.attribute == AttributeKind::Size)));

    // Learned knowledge survives a restart.
    let reopened = RuntimeRuleManager::open(&rules_path).unwrap();
    assert!(reopened.snapshot().rule("learned_size_1").is_some());
    assert_eq!(reopened.snapshot().genders.get("POUR ELLE"), Some(&Gender::Female));
}

#[test]
fn test_no_learning_offer_without_skipped_fields() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = ScriptedResolver::new()
        .brand(Answer::Clear)
        .general(Answer::Clear)
        .size(Answer::Use(("30".to_string(), SizeUnit::Ml)))
        .teach(["POUR ELLE -> gender = female"]);

    let source = rows(&[&["A1", ADP]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    assert_eq!(result.interactive_decision_count, 3);
    assert_eq!(result.learned_rule_count, 0);
    assert_eq!(converter.manager().snapshot().revision, 0);
}

// =============================================================================
// Binding Tests
// =============================================================================

#[test]
fn test_console_resolver_in_conversion() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let mut resolver = ConsoleResolver::new(Cursor::new(b"2\nn\n".to_vec()), Vec::new());

    let source = rows(&[&["A1", ADP]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();

    assert_eq!(result.records[0].size.as_deref(), Some("29.6"));
    assert_eq!(result.interactive_decision_count, 1);

    let transcript = String::from_utf8(resolver.into_output()).unwrap();
    assert!(transcript.contains("Which size?"));
    assert!(transcript.contains("[2] 29.6 ml"));
    assert!(transcript.contains("Teach a rule"));
}

#[test]
fn test_channel_resolver_in_conversion() {
    let dir = TempDir::new().unwrap();
    let mut converter = RowConverter::open(dir.path().join("rules.json")).unwrap();
    let (mut resolver, prompts) = ChannelResolver::channel();

    let answering = thread::spawn(move || {
        let mut questions = 0;
        for prompt in prompts {
            questions += 1;
            let reply = match &prompt.question {
                Question::Brand { .. } => Reply::Brand(Answer::Use(7)),
                Question::Concentration { .. } => Reply::Concentration(Answer::Skip),
                Question::Size { candidates } => Reply::Size(Answer::Use(candidates[0].clone())),
                Question::General { .. } => Reply::General(Answer::Skip),
                Question::ShouldLearn { .. } => Reply::Learn(false),
                Question::TeachingStatements => Reply::Statements(Vec::new()),
            };
            prompt.answer(reply);
        }
        questions
    });

    let source = rows(&[&["A1", ADP]]);
    let result = converter
        .convert_source(&source, &description_schema(), Some(&mut resolver))
        .unwrap();
    drop(resolver);

    // Brand, gender, size, then the learning offer.
    assert_eq!(answering.join().unwrap(), 4);
    assert_eq!(result.records[0].brand_id, Some(7));
    assert_eq!(result.records[0].size.as_deref(), Some("30"));
    assert_eq!(result.interactive_decision_count, 2);
}

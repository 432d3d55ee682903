//! Integration tests for description parsing.

use std::sync::Arc;

use essence::conversion::estimate_confidence;
use essence::rules::{PatternRule, RuleSet};
use essence::{
    AttributeKind, Concentration, DispenserType, Extractor, Gender, ProductRecord, Provenance, SizeUnit,
};

fn extractor(rules: RuleSet) -> Extractor {
    Extractor::new(Arc::new(rules)).unwrap()
}

fn with_brand(name: &str, id: u32) -> RuleSet {
    let mut rules = RuleSet::default();
    rules.brand_name_to_id.insert(name.to_string(), id);
    rules
}

// =============================================================================
// Catalog lines
// =============================================================================

#[test]
fn test_trailing_size_is_not_a_second_match() {
    let ex = extractor(RuleSet::default());
    let parsed = ex.parse_description("ADP BLU MEDITERRANEO MIRTO DI PANAREA 30ML EDT SPRAY 29.6ml");

    assert_eq!(parsed.concentration, Some(Concentration::Parfum));
    assert_eq!(parsed.size_value.as_deref(), Some("30"));
    assert_eq!(parsed.size_unit, Some(SizeUnit::Ml));
    assert_eq!(parsed.dispenser_type, Some(DispenserType::Spray));
    assert_eq!(parsed.matched_rule_names.iter().filter(|n| *n == "size").count(), 1);
}

#[test]
fn test_brand_from_dictionary() {
    let ex = extractor(with_brand("CHANEL", 1));
    let parsed = ex.parse_description("CHANEL NO 5 100ML EDP SPRAY FOR WOMEN");

    assert_eq!(parsed.brand_id, Some(1));
    assert_eq!(parsed.concentration, Some(Concentration::Edp));
    assert_eq!(parsed.size_value.as_deref(), Some("100"));
    assert_eq!(parsed.size_unit, Some(SizeUnit::Ml));
    assert_eq!(parsed.gender, Some(Gender::Female));
    assert_eq!(parsed.extracted_name.as_deref(), Some("CHANEL NO 5"));
    assert_eq!(
        parsed.provenance(AttributeKind::Brand),
        Some(&Provenance::Dictionary("CHANEL".to_string()))
    );
    assert_eq!(
        parsed.provenance(AttributeKind::Gender),
        Some(&Provenance::Rule("gender".to_string()))
    );
}

#[test]
fn test_lowercase_input_matches_uppercase_rules() {
    let ex = extractor(with_brand("CHANEL", 1));
    let upper = ex.parse_description("CHANEL NO 5 100ML EDP SPRAY FOR WOMEN");
    let lower = ex.parse_description("chanel no 5 100ml edp spray for women");
    assert_eq!(upper, lower);
}

#[test]
fn test_decimal_size_keeps_precision() {
    let ex = extractor(RuleSet::default());
    let parsed = ex.parse_description("TRAVEL SPRAY 7,5 ML");
    assert_eq!(parsed.size_value.as_deref(), Some("7.5"));
    assert_eq!(parsed.size_unit, Some(SizeUnit::Ml));

    let parsed = ex.parse_description("BODY MIST 3.4 FL OZ");
    assert_eq!(parsed.size_value.as_deref(), Some("3.4"));
    assert_eq!(parsed.size_unit, Some(SizeUnit::Oz));
}

#[test]
fn test_text_without_evidence() {
    let ex = extractor(RuleSet::default());
    let parsed = ex.parse_description("GIFT BOX");
    assert!(parsed.is_empty());
    assert!(parsed.matched_rule_names.is_empty());
    assert_eq!(parsed.summary(), "nothing detected");
}

// =============================================================================
// Rule evaluation
// =============================================================================

#[test]
fn test_fixed_value_rule() {
    let mut rules = RuleSet::default();
    rules.rules.push(
        PatternRule::new("tester", r"\b(TESTER)\b", AttributeKind::DispenserType)
            .with_value("spray")
            .with_priority(1),
    );
    let ex = extractor(rules);

    let parsed = ex.parse_description("ROSE 50ML TESTER SPLASH");
    assert_eq!(parsed.dispenser_type, Some(DispenserType::Spray));
    assert_eq!(
        parsed.provenance(AttributeKind::DispenserType),
        Some(&Provenance::Rule("tester".to_string()))
    );
}

#[test]
fn test_equal_priority_keeps_persisted_order() {
    let mut rules = RuleSet::empty();
    rules.rules.push(
        PatternRule::new("first", r"\b(ELLE)\b", AttributeKind::Gender)
            .with_value("female")
            .with_priority(1),
    );
    rules.rules.push(
        PatternRule::new("second", r"\b(ELLE)\b", AttributeKind::Gender)
            .with_value("male")
            .with_priority(1),
    );
    let ex = extractor(rules);

    let parsed = ex.parse_description("POUR ELLE");
    assert_eq!(parsed.gender, Some(Gender::Female));
    assert_eq!(parsed.matched_rule_names, vec!["first".to_string()]);
}

#[test]
fn test_case_sensitive_rule_set() {
    let mut rules = RuleSet::empty();
    rules.case_sensitive = true;
    rules.genders.insert("Elle".to_string(), Gender::Female);
    let ex = extractor(rules);

    assert_eq!(ex.parse_description("Rose Elle").gender, Some(Gender::Female));
    assert_eq!(ex.parse_description("ROSE ELLE").gender, None);
}

#[test]
fn test_longest_phrase_wins() {
    let mut rules = RuleSet::empty();
    rules.concentrations = RuleSet::default().concentrations;
    let ex = extractor(rules);

    let parsed = ex.parse_description("ROSE EAU DE COLOGNE");
    assert_eq!(parsed.concentration, Some(Concentration::Edc));
    assert_eq!(
        parsed.provenance(AttributeKind::Concentration),
        Some(&Provenance::Dictionary("EAU DE COLOGNE".to_string()))
    );
}

// =============================================================================
// Applying to records
// =============================================================================

#[test]
fn test_apply_fills_only_unset_fields() {
    let ex = extractor(RuleSet::default());
    let mut record = ProductRecord::new(4, "row");
    record.concentration = Some(Concentration::Edc);

    ex.parse_and_apply(&mut record, "ROSE 50ML EDP SPRAY", false);
    assert_eq!(record.concentration, Some(Concentration::Edc));
    assert_eq!(record.size.as_deref(), Some("50"));
    assert_eq!(record.dispenser_type, Some(DispenserType::Spray));

    ex.parse_and_apply(&mut record, "ROSE 50ML EDP SPRAY", true);
    assert_eq!(record.concentration, Some(Concentration::Edp));
}

// =============================================================================
// Candidates and confidence
// =============================================================================

#[test]
fn test_confidence_from_candidates() {
    let ex = extractor(RuleSet::default());
    let text = "ADP BLU 30ML EDT SPRAY 29.6ml";
    let parsed = ex.parse_description(text);
    let candidates = ex.candidates(text);

    let size = estimate_confidence(parsed.provenance(AttributeKind::Size), candidates.count(AttributeKind::Size));
    let concentration = estimate_confidence(
        parsed.provenance(AttributeKind::Concentration),
        candidates.count(AttributeKind::Concentration),
    );
    let gender = estimate_confidence(parsed.provenance(AttributeKind::Gender), candidates.count(AttributeKind::Gender));

    assert_eq!(size, 0.6);
    assert_eq!(concentration, 0.9);
    assert_eq!(gender, 0.0);
}

#[test]
fn test_candidates_collect_competing_genders() {
    let ex = extractor(RuleSet::default());
    let candidates = ex.candidates("DUO POUR HOMME FEMME 50ML");
    assert_eq!(candidates.genders, vec![Gender::Male, Gender::Female]);
    assert_eq!(candidates.count(AttributeKind::Gender), 2);
}

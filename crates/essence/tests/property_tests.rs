//! Property-based tests for extraction and rule persistence.
//!
//! Properties verified:
//! 1. **No panics**: parsing and teaching never crash on any input
//! 2. **Determinism**: the same text always parses the same way
//! 3. **Invariants**: extracted sizes are numbers, filling never overwrites
//!
//! ```bash
//! PROPTEST_CASES=10000 cargo test -p essence --test property_tests
//! ```

use std::sync::Arc;

use proptest::prelude::*;
use tempfile::TempDir;

use essence::interactive::TeachingStatement;
use essence::rules::{ConfigStore, RuleSet};
use essence::{AttributeKind, Concentration, Extractor, Gender, ProductRecord};

// =============================================================================
// Test Strategies
// =============================================================================

/// Arbitrary ASCII text.
fn ascii_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_\\-\\.,\\*\\s]{0,80}"
}

/// Text shaped like a catalog line.
fn catalog_line() -> impl Strategy<Value = String> {
    (
        "[A-Z]{2,10}( [A-Z]{2,10}){0,3}",
        1u32..500,
        prop_oneof![Just("ML"), Just("ml"), Just(" ML"), Just("OZ"), Just("G")],
        prop_oneof![Just(""), Just(" EDT"), Just(" EDP"), Just(" PARFUM")],
        prop_oneof![Just(""), Just(" SPRAY"), Just(" VAPO"), Just(" SPLASH")],
        prop_oneof![Just(""), Just(" FOR WOMEN"), Just(" POUR HOMME"), Just(" UNISEX")],
    )
        .prop_map(|(name, size, unit, conc, disp, gender)| {
            format!("{} {}{}{}{}{}", name, size, unit, conc, disp, gender)
        })
}

/// Dictionary tokens the rule set accepts.
fn token() -> impl Strategy<Value = String> {
    "[A-Z]{1,8}( [A-Z]{1,8}){0,2}"
}

fn default_extractor() -> Extractor {
    Extractor::new(Arc::new(RuleSet::default())).unwrap()
}

// =============================================================================
// Extraction Properties
// =============================================================================

proptest! {
    #[test]
    fn parse_never_panics(text in ascii_string()) {
        let ex = default_extractor();
        let _ = ex.parse_description(&text);
        let _ = ex.candidates(&text);
    }

    #[test]
    fn parse_is_deterministic(text in catalog_line()) {
        let ex = default_extractor();
        prop_assert_eq!(ex.parse_description(&text), ex.parse_description(&text));
    }

    #[test]
    fn normalize_is_idempotent(text in ascii_string()) {
        let ex = default_extractor();
        let once = ex.normalize(&text);
        prop_assert_eq!(ex.normalize(&once), once);
    }

    #[test]
    fn parsing_normalized_text_changes_nothing(text in catalog_line()) {
        let ex = default_extractor();
        let normalized = ex.normalize(&text);
        prop_assert_eq!(ex.parse_description(&normalized), ex.parse_description(&text));
    }

    #[test]
    fn extracted_size_is_a_number(text in catalog_line()) {
        let ex = default_extractor();
        let parsed = ex.parse_description(&text);
        let size = parsed.size_value.expect("catalog lines carry a size");
        let value: f64 = size.parse().expect("size parses as a number");
        prop_assert!(value >= 1.0);
        prop_assert!(parsed.size_unit.is_some());
    }

    #[test]
    fn every_field_has_provenance(text in catalog_line()) {
        let ex = default_extractor();
        let parsed = ex.parse_description(&text);
        for kind in AttributeKind::ALL {
            prop_assert_eq!(parsed.is_set(kind), parsed.provenance(kind).is_some());
        }
    }

    #[test]
    fn fill_never_overwrites(text in catalog_line()) {
        let ex = default_extractor();
        let mut record = ProductRecord::new(1, text.clone());
        record.concentration = Some(Concentration::Extrait);
        record.gender = Some(Gender::Unisex);

        ex.parse_and_apply(&mut record, &text, false);
        prop_assert_eq!(record.concentration, Some(Concentration::Extrait));
        prop_assert_eq!(record.gender, Some(Gender::Unisex));
    }
}

// =============================================================================
// Teaching and Persistence Properties
// =============================================================================

proptest! {
    #[test]
    fn teaching_parse_never_panics(text in "\\PC{0,60}") {
        let _ = text.parse::<TeachingStatement>();
    }

    #[test]
    fn rule_set_round_trips(
        genders in prop::collection::vec((token(), prop_oneof![Just(Gender::Male), Just(Gender::Female), Just(Gender::Unisex)]), 0..5),
        brands in prop::collection::vec((token(), 1u32..10_000), 0..5),
    ) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");

        let mut rules = RuleSet::default();
        for (token, gender) in genders {
            rules.genders.insert(token, gender);
        }
        for (token, id) in brands {
            rules.brand_name_to_id.insert(token, id);
        }

        let saved = ConfigStore::create(&path, rules).unwrap();
        let loaded = ConfigStore::load(&path).unwrap();
        prop_assert_eq!(loaded.rules(), saved.rules());
    }
}

//! The rule set: dictionaries, name maps, ordered pattern rules.

use std::collections::HashSet;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EssenceError, Result};
use crate::schema::{AttributeKind, Concentration, DispenserType, Gender, SizeUnit};

/// Current version of the persisted rule set format.
pub const FORMAT_VERSION: &str = "1.0.0";

/// A regex-based extraction instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Unique rule name, recorded on every successful extraction.
    pub name: String,

    /// Regular expression evaluated against normalized text.
    pub pattern: String,

    /// Attribute this rule extracts.
    pub attribute: AttributeKind,

    /// Capture groups to read, in order.
    #[serde(default = "default_extract_groups")]
    pub extract_groups: Vec<usize>,

    /// Evaluation order; lower runs first.
    #[serde(default)]
    pub priority: i32,

    /// Stop iterating this rule's matches after the first success.
    #[serde(default)]
    pub stop_on_match: bool,

    /// Fixed value assigned instead of a dictionary lookup. For size rules
    /// this is the unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

fn default_extract_groups() -> Vec<usize> {
    vec![1]
}

impl PatternRule {
    /// Create a rule reading capture group 1 at priority 100.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        attribute: AttributeKind,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            attribute,
            extract_groups: default_extract_groups(),
            priority: 100,
            stop_on_match: false,
            value: None,
        }
    }

    /// Set the evaluation priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the capture groups to read.
    pub fn with_groups(mut self, groups: Vec<usize>) -> Self {
        self.extract_groups = groups;
        self
    }

    /// Stop after the first successful match.
    pub fn stop_on_match(mut self) -> Self {
        self.stop_on_match = true;
        self
    }

    /// Assign a fixed value instead of looking one up.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Describe everything wrong with this rule.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push(format!("Rule with pattern '{}' has an empty name", self.pattern));
        }
        if self.pattern.trim().is_empty() {
            problems.push(format!("Rule '{}' has an empty pattern", self.name));
            return problems;
        }

        match Regex::new(&self.pattern) {
            Ok(re) => {
                let groups = re.captures_len() - 1;
                if self.extract_groups.is_empty() {
                    problems.push(format!("Rule '{}' extracts no capture group", self.name));
                }
                for &g in &self.extract_groups {
                    if g == 0 || g > groups {
                        problems.push(format!(
                            "Rule '{}' extracts group {} but its pattern has {} group(s)",
                            self.name, g, groups
                        ));
                    }
                }
            }
            Err(e) => problems.push(format!(
                "Rule '{}' pattern does not compile: {}",
                self.name, e
            )),
        }

        if let Some(ref value) = self.value {
            if let Err(e) = check_fixed_value(self.attribute, value) {
                problems.push(format!("Rule '{}' {}", self.name, e));
            }
        }

        problems
    }
}

/// Check that a fixed rule value parses for its attribute.
fn check_fixed_value(attribute: AttributeKind, value: &str) -> std::result::Result<(), String> {
    match attribute {
        AttributeKind::Concentration => value.parse::<Concentration>().map(|_| ()),
        AttributeKind::DispenserType => value.parse::<DispenserType>().map(|_| ()),
        AttributeKind::Gender => value.parse::<Gender>().map(|_| ()),
        AttributeKind::Size | AttributeKind::Unit => value.parse::<SizeUnit>().map(|_| ()),
        AttributeKind::Brand => value
            .trim()
            .parse::<u32>()
            .map(|_| ())
            .map_err(|_| format!("brand id '{}' is not a number", value.trim())),
        AttributeKind::Name => Ok(()),
    }
}

/// Versioned extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Version of the persisted format.
    #[serde(default = "default_format_version")]
    pub format_version: String,

    /// Incremented on every persisted mutation.
    #[serde(default)]
    pub revision: u64,

    /// Match tokens case-sensitively. Keys are uppercased otherwise.
    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default)]
    pub concentrations: IndexMap<String, Concentration>,

    #[serde(default)]
    pub dispenser_types: IndexMap<String, DispenserType>,

    #[serde(default)]
    pub genders: IndexMap<String, Gender>,

    #[serde(default)]
    pub units: IndexMap<String, SizeUnit>,

    /// Brand name to brand id.
    #[serde(default)]
    pub brand_name_to_id: IndexMap<String, u32>,

    /// Product name to the id of the brand that makes it.
    #[serde(default)]
    pub product_name_to_id: IndexMap<String, u32>,

    /// Pattern rules in persisted order.
    #[serde(default)]
    pub rules: Vec<PatternRule>,

    /// Patterns stripped from text before any rule runs.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_format_version() -> String {
    FORMAT_VERSION.to_string()
}

impl RuleSet {
    /// Create a rule set with no rules and empty dictionaries.
    pub fn empty() -> Self {
        Self {
            format_version: default_format_version(),
            revision: 0,
            case_sensitive: false,
            concentrations: IndexMap::new(),
            dispenser_types: IndexMap::new(),
            genders: IndexMap::new(),
            units: IndexMap::new(),
            brand_name_to_id: IndexMap::new(),
            product_name_to_id: IndexMap::new(),
            rules: Vec::new(),
            ignore_patterns: Vec::new(),
        }
    }

    /// Normalize a dictionary token: collapse whitespace and, unless the set
    /// is case-sensitive, uppercase it.
    pub fn normalize_key(&self, token: &str) -> String {
        let collapsed = token.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.case_sensitive {
            collapsed
        } else {
            collapsed.to_uppercase()
        }
    }

    /// Re-key every dictionary through [`RuleSet::normalize_key`].
    ///
    /// When two keys collapse onto the same normalized form, the later entry
    /// wins.
    pub fn normalize_keys(&mut self) {
        fn rekey<V: Clone>(set: &RuleSet, map: &IndexMap<String, V>) -> IndexMap<String, V> {
            map.iter()
                .map(|(k, v)| (set.normalize_key(k), v.clone()))
                .collect()
        }

        self.concentrations = rekey(self, &self.concentrations);
        self.dispenser_types = rekey(self, &self.dispenser_types);
        self.genders = rekey(self, &self.genders);
        self.units = rekey(self, &self.units);
        self.brand_name_to_id = rekey(self, &self.brand_name_to_id);
        self.product_name_to_id = rekey(self, &self.product_name_to_id);
    }

    /// Get a rule by name.
    pub fn rule(&self, name: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Insert a dictionary entry for an attribute, parsing the value for
    /// that attribute's vocabulary.
    ///
    /// Size has no dictionary; size knowledge is expressed as rules.
    pub fn insert_entry(&mut self, kind: AttributeKind, token: &str, value: &str) -> Result<()> {
        let key = self.normalize_key(token);
        if key.is_empty() {
            return Err(EssenceError::InvalidRule(format!(
                "empty {} token",
                kind.label()
            )));
        }
        let invalid = |e: String| EssenceError::InvalidRule(e);

        match kind {
            AttributeKind::Concentration => {
                let v = value.parse::<Concentration>().map_err(invalid)?;
                self.concentrations.insert(key, v);
            }
            AttributeKind::DispenserType => {
                let v = value.parse::<DispenserType>().map_err(invalid)?;
                self.dispenser_types.insert(key, v);
            }
            AttributeKind::Gender => {
                let v = value.parse::<Gender>().map_err(invalid)?;
                self.genders.insert(key, v);
            }
            AttributeKind::Unit => {
                let v = value.parse::<SizeUnit>().map_err(invalid)?;
                self.units.insert(key, v);
            }
            AttributeKind::Brand => {
                let id = parse_id(value)?;
                self.brand_name_to_id.insert(key, id);
            }
            AttributeKind::Name => {
                let id = parse_id(value)?;
                self.product_name_to_id.insert(key, id);
            }
            AttributeKind::Size => {
                return Err(EssenceError::InvalidRule(
                    "size has no dictionary; teach a size pattern instead".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Remove a dictionary entry. Returns true if it existed.
    pub fn remove_entry(&mut self, kind: AttributeKind, token: &str) -> bool {
        let key = self.normalize_key(token);
        match kind {
            AttributeKind::Concentration => self.concentrations.shift_remove(&key).is_some(),
            AttributeKind::DispenserType => self.dispenser_types.shift_remove(&key).is_some(),
            AttributeKind::Gender => self.genders.shift_remove(&key).is_some(),
            AttributeKind::Unit => self.units.shift_remove(&key).is_some(),
            AttributeKind::Brand => self.brand_name_to_id.shift_remove(&key).is_some(),
            AttributeKind::Name => self.product_name_to_id.shift_remove(&key).is_some(),
            AttributeKind::Size => false,
        }
    }

    /// List a dictionary as (token, value label) pairs in stored order.
    pub fn entries(&self, kind: AttributeKind) -> Vec<(String, String)> {
        fn list<V: ToString>(map: &IndexMap<String, V>) -> Vec<(String, String)> {
            map.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
        }

        match kind {
            AttributeKind::Concentration => list(&self.concentrations),
            AttributeKind::DispenserType => list(&self.dispenser_types),
            AttributeKind::Gender => list(&self.genders),
            AttributeKind::Unit => list(&self.units),
            AttributeKind::Brand => list(&self.brand_name_to_id),
            AttributeKind::Name => list(&self.product_name_to_id),
            AttributeKind::Size => Vec::new(),
        }
    }

    /// Describe every problem with this rule set in human-readable form.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for rule in &self.rules {
            problems.extend(rule.problems());
            if !rule.name.trim().is_empty() && !seen.insert(rule.name.as_str()) {
                problems.push(format!("Duplicate rule name '{}'", rule.name));
            }
        }

        for pattern in &self.ignore_patterns {
            if pattern.trim().is_empty() {
                problems.push("Empty ignore pattern".to_string());
            } else if let Err(e) = Regex::new(pattern) {
                problems.push(format!(
                    "Ignore pattern '{}' does not compile: {}",
                    pattern, e
                ));
            }
        }

        problems
    }

    /// Fail with a configuration error if any rule set problem exists.
    pub fn ensure_valid(&self) -> Result<()> {
        let problems = self.validate();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(EssenceError::Config(problems.join("; ")))
        }
    }
}

fn parse_id(value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| EssenceError::InvalidRule(format!("'{}' is not a numeric id", value.trim())))
}

impl Default for RuleSet {
    /// The built-in catalog rule set.
    fn default() -> Self {
        let mut set = RuleSet::empty();

        set.rules = vec![
            PatternRule::new(
                "size",
                r"(\d+(?:[.,]\d+)?)\s*(MLS|ML|FL\.?\s?OZ|OZ|GR|G)\b",
                AttributeKind::Size,
            )
            .with_groups(vec![1, 2])
            .with_priority(10)
            .stop_on_match(),
            PatternRule::new(
                "concentration",
                r"\b(EAU DE PARFUM|EAU DE TOILETTE|EAU DE COLOGNE|EXTRAIT DE PARFUM|EXTRAIT|EDP|EDT|EDC|PARFUM|COLOGNE|AFTER ?SHAVE)\b",
                AttributeKind::Concentration,
            )
            .with_priority(20)
            .stop_on_match(),
            PatternRule::new(
                "dispenser",
                r"\b(SPRAY|VAPO|SPLASH|ROLL[ -]?ON|REFILL|RECHARGE|STICK)\b",
                AttributeKind::DispenserType,
            )
            .with_priority(30)
            .stop_on_match(),
            PatternRule::new(
                "gender",
                r"\b(?:FOR|POUR)\s+(WOMEN|WOMAN|MEN|MAN|HER|HIM|HOMME|FEMME)\b",
                AttributeKind::Gender,
            )
            .with_priority(40)
            .stop_on_match(),
            PatternRule::new(
                "name",
                r"^(.+?)\s+\d+(?:[.,]\d+)?\s*(?:MLS|ML|FL\.?\s?OZ|OZ|GR|G)\b",
                AttributeKind::Name,
            )
            .with_priority(90)
            .stop_on_match(),
        ];

        set.ignore_patterns = vec![r"\*+".to_string(), r"\bNEW\b".to_string()];

        for (token, value) in [
            ("EAU DE PARFUM", Concentration::Edp),
            ("EDP", Concentration::Edp),
            ("EAU DE TOILETTE", Concentration::Parfum),
            ("EDT", Concentration::Parfum),
            ("PARFUM", Concentration::Parfum),
            ("EAU DE COLOGNE", Concentration::Edc),
            ("EDC", Concentration::Edc),
            ("COLOGNE", Concentration::Edc),
            ("EXTRAIT DE PARFUM", Concentration::Extrait),
            ("EXTRAIT", Concentration::Extrait),
            ("AFTER SHAVE", Concentration::AfterShave),
            ("AFTERSHAVE", Concentration::AfterShave),
        ] {
            set.concentrations.insert(token.to_string(), value);
        }

        for (token, value) in [
            ("SPRAY", DispenserType::Spray),
            ("VAPO", DispenserType::Spray),
            ("SPLASH", DispenserType::Splash),
            ("ROLL ON", DispenserType::RollOn),
            ("ROLL-ON", DispenserType::RollOn),
            ("ROLLON", DispenserType::RollOn),
            ("REFILL", DispenserType::Refill),
            ("RECHARGE", DispenserType::Refill),
            ("STICK", DispenserType::Stick),
        ] {
            set.dispenser_types.insert(token.to_string(), value);
        }

        for (token, value) in [
            ("WOMEN", Gender::Female),
            ("WOMAN", Gender::Female),
            ("FEMME", Gender::Female),
            ("HER", Gender::Female),
            ("MEN", Gender::Male),
            ("MAN", Gender::Male),
            ("HOMME", Gender::Male),
            ("HIM", Gender::Male),
            ("UNISEX", Gender::Unisex),
        ] {
            set.genders.insert(token.to_string(), value);
        }

        for (token, value) in [
            ("ML", SizeUnit::Ml),
            ("MLS", SizeUnit::Ml),
            ("OZ", SizeUnit::Oz),
            ("FL OZ", SizeUnit::Oz),
            ("FL.OZ", SizeUnit::Oz),
            ("FL. OZ", SizeUnit::Oz),
            ("FLOZ", SizeUnit::Oz),
            ("G", SizeUnit::G),
            ("GR", SizeUnit::G),
        ] {
            set.units.insert(token.to_string(), value);
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_set_is_valid() {
        let set = RuleSet::default();
        assert!(set.validate().is_empty(), "{:?}", set.validate());
        assert_eq!(set.rules.len(), 5);
        assert_eq!(set.concentrations.get("EDT"), Some(&Concentration::Parfum));
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut set = RuleSet::empty();
        set.rules.push(PatternRule::new("", r"(\d+)", AttributeKind::Size));
        set.rules.push(PatternRule::new("broken", r"(\d+", AttributeKind::Size));
        set.rules.push(PatternRule::new("nogroup", r"\d+", AttributeKind::Size));
        set.rules.push(PatternRule::new("dup", r"(A)", AttributeKind::Gender));
        set.rules.push(PatternRule::new("dup", r"(B)", AttributeKind::Gender));
        set.ignore_patterns.push("[".to_string());

        let problems = set.validate();
        assert!(problems.iter().any(|p| p.contains("empty name")));
        assert!(problems.iter().any(|p| p.contains("'broken' pattern does not compile")));
        assert!(problems.iter().any(|p| p.contains("'nogroup' extracts group 1")));
        assert!(problems.iter().any(|p| p.contains("Duplicate rule name 'dup'")));
        assert!(problems.iter().any(|p| p.contains("Ignore pattern '['")));
        assert!(set.ensure_valid().is_err());
    }

    #[test]
    fn test_insert_and_remove_entries() {
        let mut set = RuleSet::empty();
        set.insert_entry(AttributeKind::Gender, "  pour   elle ", "female").unwrap();
        assert_eq!(set.genders.get("POUR ELLE"), Some(&Gender::Female));

        assert!(set.insert_entry(AttributeKind::Brand, "chanel", "one").is_err());
        set.insert_entry(AttributeKind::Brand, "chanel", "1").unwrap();
        assert_eq!(set.brand_name_to_id.get("CHANEL"), Some(&1));

        assert!(set.insert_entry(AttributeKind::Size, "30ML", "ml").is_err());
        assert!(set.insert_entry(AttributeKind::Concentration, "XYZ", "nope").is_err());

        assert!(set.remove_entry(AttributeKind::Gender, "pour elle"));
        assert!(!set.remove_entry(AttributeKind::Gender, "pour elle"));
    }

    #[test]
    fn test_case_sensitive_keys_are_kept() {
        let mut set = RuleSet::empty();
        set.case_sensitive = true;
        set.insert_entry(AttributeKind::Brand, "Chanel", "1").unwrap();
        assert!(set.brand_name_to_id.contains_key("Chanel"));
        assert!(!set.brand_name_to_id.contains_key("CHANEL"));
    }

    #[test]
    fn test_normalize_keys() {
        let mut set = RuleSet::empty();
        set.genders.insert("pour  homme".to_string(), Gender::Male);
        set.normalize_keys();
        assert_eq!(set.genders.get("POUR HOMME"), Some(&Gender::Male));
    }

    #[test]
    fn test_fixed_value_checked() {
        let rule = PatternRule::new("x", r"(\d+)\s*MILLILITRI", AttributeKind::Size).with_value("litres");
        assert!(rule.problems().iter().any(|p| p.contains("unrecognized unit")));
    }
}

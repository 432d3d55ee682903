//! Turns free catalog text into structured attributes.

use std::sync::Arc;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use tracing::trace;

use crate::error::{EssenceError, Result};
use crate::record::ProductRecord;
use crate::rules::RuleSet;
use crate::schema::{format_magnitude, AttributeKind, SizeUnit};

use super::compiled::{CompiledRule, CompiledRules};
use super::parsed::{push_distinct, CandidateSet, ParsedAttributes, Provenance};

/// Attributes the dictionary fallback may fill.
const FALLBACK_KINDS: [AttributeKind; 5] = [
    AttributeKind::Concentration,
    AttributeKind::DispenserType,
    AttributeKind::Gender,
    AttributeKind::Brand,
    AttributeKind::Unit,
];

/// Compiled extraction engine for one rule set snapshot.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Arc<RuleSet>,
    compiled: CompiledRules,
    ignore: Vec<Regex>,
}

impl Extractor {
    /// Compile a rule set. Fails fast on the first invalid pattern.
    pub fn new(rules: Arc<RuleSet>) -> Result<Self> {
        let compiled = CompiledRules::compile(&rules)?;

        let ignore = rules
            .ignore_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    EssenceError::Config(format!("Ignore pattern '{}' does not compile: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            compiled,
            ignore,
        })
    }

    /// The rule set this extractor was compiled from.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Number of compiled pattern rules.
    pub fn rule_count(&self) -> usize {
        self.compiled.len()
    }

    /// Uppercase (unless case-sensitive), trim, strip ignore patterns and
    /// collapse whitespace.
    pub fn normalize(&self, text: &str) -> String {
        let mut normalized = if self.rules.case_sensitive {
            text.trim().to_string()
        } else {
            text.trim().to_uppercase()
        };

        for pattern in &self.ignore {
            normalized = pattern.replace_all(&normalized, " ").into_owned();
        }

        normalized.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Parse a description into structured attributes.
    pub fn parse_description(&self, text: &str) -> ParsedAttributes {
        let normalized = self.normalize(text);
        let mut parsed = ParsedAttributes::default();

        if normalized.is_empty() {
            return parsed;
        }

        for compiled in self.compiled.iter() {
            if self.field_taken(&parsed, compiled.rule.attribute) {
                continue;
            }

            for caps in compiled.regex.captures_iter(&normalized) {
                if self.apply_capture(compiled, &caps, &mut parsed) {
                    trace!(rule = %compiled.rule.name, text = %normalized, "rule matched");
                    if !parsed.matched_rule_names.contains(&compiled.rule.name) {
                        parsed.matched_rule_names.push(compiled.rule.name.clone());
                    }
                }
                if compiled.rule.stop_on_match || self.field_taken(&parsed, compiled.rule.attribute) {
                    break;
                }
            }
        }

        self.dictionary_fallback(&normalized, &mut parsed);
        parsed
    }

    /// Parse `text` and copy the result into `record`.
    ///
    /// Without `overwrite`, only fields the record has not set yet are filled.
    pub fn parse_and_apply(
        &self,
        record: &mut ProductRecord,
        text: &str,
        overwrite: bool,
    ) -> ParsedAttributes {
        let parsed = self.parse_description(text);
        record.apply(&parsed, overwrite);
        parsed
    }

    /// Collect every distinct value any rule match or dictionary phrase
    /// yields, ignoring `stop_on_match` and first-success precedence.
    pub fn candidates(&self, text: &str) -> CandidateSet {
        let normalized = self.normalize(text);
        let mut set = CandidateSet::default();

        for compiled in self.compiled.iter() {
            for caps in compiled.regex.captures_iter(&normalized) {
                let mut single = ParsedAttributes::default();
                if !self.apply_capture(compiled, &caps, &mut single) {
                    continue;
                }
                if let Some(c) = single.concentration {
                    push_distinct(&mut set.concentrations, c);
                }
                if let Some(d) = single.dispenser_type {
                    push_distinct(&mut set.dispenser_types, d);
                }
                if let Some(g) = single.gender {
                    push_distinct(&mut set.genders, g);
                }
                if let Some(size) = single.size_value {
                    push_distinct(&mut set.sizes, (size, single.size_unit));
                }
                if let Some(b) = single.brand_id {
                    push_distinct(&mut set.brands, b);
                }
                if let Some(n) = single.extracted_name {
                    push_distinct(&mut set.names, n);
                }
            }
        }

        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        for (_, value) in phrase_hits(&tokens, &self.rules.concentrations) {
            push_distinct(&mut set.concentrations, value);
        }
        for (_, value) in phrase_hits(&tokens, &self.rules.dispenser_types) {
            push_distinct(&mut set.dispenser_types, value);
        }
        for (_, value) in phrase_hits(&tokens, &self.rules.genders) {
            push_distinct(&mut set.genders, value);
        }
        for (_, value) in phrase_hits(&tokens, &self.rules.brand_name_to_id) {
            push_distinct(&mut set.brands, value);
        }

        set
    }

    /// Whether a rule for `kind` can still contribute.
    fn field_taken(&self, parsed: &ParsedAttributes, kind: AttributeKind) -> bool {
        match kind {
            // A size rule may still supply the unit for an earlier magnitude.
            AttributeKind::Size => parsed.size_value.is_some() && parsed.size_unit.is_some(),
            _ => parsed.is_set(kind),
        }
    }

    /// Apply one regex match of a rule. Returns true if any field was set.
    fn apply_capture(
        &self,
        compiled: &CompiledRule,
        caps: &Captures<'_>,
        parsed: &mut ParsedAttributes,
    ) -> bool {
        let rule = &compiled.rule;
        let group = |n: usize| {
            rule.extract_groups
                .get(n)
                .and_then(|&g| caps.get(g))
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
        };
        let provenance = || Provenance::Rule(rule.name.clone());

        match rule.attribute {
            AttributeKind::Size => {
                let mut hit = false;
                if parsed.size_value.is_none() {
                    if let Some(magnitude) = group(0).and_then(format_magnitude) {
                        parsed.size_value = Some(magnitude);
                        parsed.provenance.insert(AttributeKind::Size, provenance());
                        hit = true;
                    }
                }
                // Only take a unit that belongs to the magnitude just read.
                if hit && parsed.size_unit.is_none() {
                    let unit = match rule.value.as_deref() {
                        Some(fixed) => fixed.parse::<SizeUnit>().ok(),
                        None => group(1).and_then(|u| self.lookup(&self.rules.units, u)),
                    };
                    if let Some(unit) = unit {
                        parsed.size_unit = Some(unit);
                        parsed.provenance.insert(AttributeKind::Unit, provenance());
                    }
                }
                hit
            }
            AttributeKind::Concentration => {
                let value = match rule.value.as_deref() {
                    Some(fixed) => group(0).and(fixed.parse().ok()),
                    None => group(0).and_then(|t| self.lookup(&self.rules.concentrations, t)),
                };
                set_once(&mut parsed.concentration, value, AttributeKind::Concentration, &mut parsed.provenance, provenance)
            }
            AttributeKind::DispenserType => {
                let value = match rule.value.as_deref() {
                    Some(fixed) => group(0).and(fixed.parse().ok()),
                    None => group(0).and_then(|t| self.lookup(&self.rules.dispenser_types, t)),
                };
                set_once(&mut parsed.dispenser_type, value, AttributeKind::DispenserType, &mut parsed.provenance, provenance)
            }
            AttributeKind::Gender => {
                let value = match rule.value.as_deref() {
                    Some(fixed) => group(0).and(fixed.parse().ok()),
                    None => group(0).and_then(|t| self.lookup(&self.rules.genders, t)),
                };
                set_once(&mut parsed.gender, value, AttributeKind::Gender, &mut parsed.provenance, provenance)
            }
            AttributeKind::Unit => {
                let value = match rule.value.as_deref() {
                    Some(fixed) => group(0).and(fixed.parse().ok()),
                    None => group(0).and_then(|t| self.lookup(&self.rules.units, t)),
                };
                set_once(&mut parsed.size_unit, value, AttributeKind::Unit, &mut parsed.provenance, provenance)
            }
            AttributeKind::Brand => {
                let value = match rule.value.as_deref() {
                    Some(fixed) => group(0).and(fixed.trim().parse().ok()),
                    None => group(0).and_then(|t| self.lookup(&self.rules.brand_name_to_id, t)),
                };
                set_once(&mut parsed.brand_id, value, AttributeKind::Brand, &mut parsed.provenance, provenance)
            }
            AttributeKind::Name => {
                let Some(name) = group(0) else {
                    return false;
                };
                let brand = self.lookup(&self.rules.product_name_to_id, name);
                let hit = set_once(
                    &mut parsed.extracted_name,
                    Some(name.to_string()),
                    AttributeKind::Name,
                    &mut parsed.provenance,
                    provenance,
                );
                if hit {
                    set_once(&mut parsed.brand_id, brand, AttributeKind::Brand, &mut parsed.provenance, provenance);
                }
                hit
            }
        }
    }

    /// For each attribute still unset, take the first dictionary phrase
    /// found scanning tokens left to right.
    fn dictionary_fallback(&self, normalized: &str, parsed: &mut ParsedAttributes) {
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.is_empty() {
            return;
        }

        for kind in FALLBACK_KINDS {
            if parsed.is_set(kind) {
                continue;
            }
            let hit = match kind {
                AttributeKind::Concentration => first_hit(&tokens, &self.rules.concentrations)
                    .map(|(phrase, v)| {
                        parsed.concentration = Some(v);
                        phrase
                    }),
                AttributeKind::DispenserType => first_hit(&tokens, &self.rules.dispenser_types)
                    .map(|(phrase, v)| {
                        parsed.dispenser_type = Some(v);
                        phrase
                    }),
                AttributeKind::Gender => first_hit(&tokens, &self.rules.genders).map(|(phrase, v)| {
                    parsed.gender = Some(v);
                    phrase
                }),
                AttributeKind::Brand => first_hit(&tokens, &self.rules.brand_name_to_id)
                    .map(|(phrase, v)| {
                        parsed.brand_id = Some(v);
                        phrase
                    }),
                // A bare unit token means nothing without a magnitude.
                AttributeKind::Unit if parsed.size_value.is_some() => {
                    first_hit(&tokens, &self.rules.units).map(|(phrase, v)| {
                        parsed.size_unit = Some(v);
                        phrase
                    })
                }
                _ => None,
            };

            if let Some(phrase) = hit {
                trace!(kind = %kind, phrase = %phrase, "dictionary fallback hit");
                parsed.provenance.insert(kind, Provenance::Dictionary(phrase));
            }
        }
    }

    fn lookup<V: Copy>(&self, map: &IndexMap<String, V>, token: &str) -> Option<V> {
        map.get(&self.rules.normalize_key(token)).copied()
    }
}

/// Set an unset field and record where it came from.
fn set_once<T>(
    slot: &mut Option<T>,
    value: Option<T>,
    kind: AttributeKind,
    provenance: &mut std::collections::BTreeMap<AttributeKind, Provenance>,
    source: impl Fn() -> Provenance,
) -> bool {
    match value {
        Some(v) if slot.is_none() => {
            *slot = Some(v);
            provenance.insert(kind, source());
            true
        }
        _ => false,
    }
}

/// Every dictionary phrase starting at each token, longest phrase first.
fn phrase_hits<V: Copy>(tokens: &[&str], map: &IndexMap<String, V>) -> Vec<(String, V)> {
    let longest = map
        .keys()
        .map(|k| k.split(' ').count())
        .max()
        .unwrap_or(0);

    let mut hits = Vec::new();
    for start in 0..tokens.len() {
        let max_len = longest.min(tokens.len() - start);
        for len in (1..=max_len).rev() {
            let phrase = tokens[start..start + len].join(" ");
            if let Some(value) = map.get(&phrase) {
                hits.push((phrase, *value));
                break;
            }
        }
    }
    hits
}

fn first_hit<V: Copy>(tokens: &[&str], map: &IndexMap<String, V>) -> Option<(String, V)> {
    phrase_hits(tokens, map).into_iter().next()
}

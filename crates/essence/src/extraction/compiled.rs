//! Compiled pattern rules, ordered by priority and grouped by attribute.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{EssenceError, Result};
use crate::rules::{PatternRule, RuleSet};
use crate::schema::AttributeKind;

/// A rule together with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: PatternRule,
    pub regex: Regex,
}

/// All rules of a rule set, compiled.
///
/// `ordered` holds every rule in ascending priority (stable for ties, so
/// persisted order breaks them). `by_attribute` indexes into `ordered`, so
/// several rules can compete for the same attribute.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    ordered: Vec<CompiledRule>,
    by_attribute: BTreeMap<AttributeKind, Vec<usize>>,
}

impl CompiledRules {
    /// Compile every rule, failing on the first invalid pattern.
    pub fn compile(rules: &RuleSet) -> Result<Self> {
        let mut ordered = Vec::with_capacity(rules.rules.len());

        for rule in &rules.rules {
            let regex = Regex::new(&rule.pattern).map_err(|e| {
                EssenceError::Config(format!(
                    "Rule '{}' pattern does not compile: {}",
                    rule.name, e
                ))
            })?;
            ordered.push(CompiledRule {
                rule: rule.clone(),
                regex,
            });
        }

        ordered.sort_by_key(|c| c.rule.priority);

        let mut by_attribute: BTreeMap<AttributeKind, Vec<usize>> = BTreeMap::new();
        for (idx, compiled) in ordered.iter().enumerate() {
            by_attribute
                .entry(compiled.rule.attribute)
                .or_default()
                .push(idx);
        }

        Ok(Self {
            ordered,
            by_attribute,
        })
    }

    /// Every rule in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.ordered.iter()
    }

    /// Rules targeting one attribute, in evaluation order.
    pub fn for_attribute(&self, kind: AttributeKind) -> impl Iterator<Item = &CompiledRule> {
        self.by_attribute
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.ordered[idx])
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

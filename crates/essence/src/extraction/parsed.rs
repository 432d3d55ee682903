//! Extraction output types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{AttributeKind, Concentration, DispenserType, Gender, SizeUnit};

/// Where an extracted value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "detail", rename_all = "snake_case")]
pub enum Provenance {
    /// A pattern rule, by name.
    Rule(String),
    /// The dictionary fallback, with the token or phrase that hit.
    Dictionary(String),
}

impl Provenance {
    /// Returns true if the value came from a pattern rule.
    pub fn is_rule(&self) -> bool {
        matches!(self, Provenance::Rule(_))
    }
}

/// Structured attributes parsed from one piece of text.
///
/// A `None` field means the text carried no evidence for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concentration: Option<Concentration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispenser_type: Option<DispenserType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    /// Size magnitude, formatted without a forced trailing zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_unit: Option<SizeUnit>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_name: Option<String>,

    /// Names of the rules that extracted something, in evaluation order.
    #[serde(default)]
    pub matched_rule_names: Vec<String>,

    /// Source of each extracted field.
    #[serde(default)]
    pub provenance: BTreeMap<AttributeKind, Provenance>,
}

impl ParsedAttributes {
    /// Returns true if the given attribute was extracted.
    pub fn is_set(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::Concentration => self.concentration.is_some(),
            AttributeKind::DispenserType => self.dispenser_type.is_some(),
            AttributeKind::Gender => self.gender.is_some(),
            AttributeKind::Size => self.size_value.is_some(),
            AttributeKind::Unit => self.size_unit.is_some(),
            AttributeKind::Brand => self.brand_id.is_some(),
            AttributeKind::Name => self.extracted_name.is_some(),
        }
    }

    /// Display form of an extracted attribute.
    pub fn value_label(&self, kind: AttributeKind) -> Option<String> {
        match kind {
            AttributeKind::Concentration => self.concentration.map(|c| c.to_string()),
            AttributeKind::DispenserType => self.dispenser_type.map(|d| d.to_string()),
            AttributeKind::Gender => self.gender.map(|g| g.to_string()),
            AttributeKind::Size => self.size_value.clone(),
            AttributeKind::Unit => self.size_unit.map(|u| u.to_string()),
            AttributeKind::Brand => self.brand_id.map(|id| id.to_string()),
            AttributeKind::Name => self.extracted_name.clone(),
        }
    }

    /// Source of an extracted attribute.
    pub fn provenance(&self, kind: AttributeKind) -> Option<&Provenance> {
        self.provenance.get(&kind)
    }

    /// Returns true if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        AttributeKind::ALL.iter().all(|k| !self.is_set(*k))
    }

    /// One-line summary such as `concentration=EDP, size=100 ml`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for kind in AttributeKind::ALL {
            if kind == AttributeKind::Unit {
                continue;
            }
            let Some(value) = self.value_label(kind) else {
                continue;
            };
            let value = match (kind, self.size_unit) {
                (AttributeKind::Size, Some(unit)) => format!("{} {}", value, unit),
                _ => value,
            };
            parts.push(format!("{}={}", kind.label(), value));
        }
        if parts.is_empty() {
            "nothing detected".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Every distinct value the rules and dictionaries can find in a text, per
/// attribute, in the order found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub concentrations: Vec<Concentration>,
    pub dispenser_types: Vec<DispenserType>,
    pub genders: Vec<Gender>,
    pub sizes: Vec<(String, Option<SizeUnit>)>,
    pub brands: Vec<u32>,
    pub names: Vec<String>,
}

impl CandidateSet {
    /// Number of distinct candidates for an attribute.
    pub fn count(&self, kind: AttributeKind) -> usize {
        match kind {
            AttributeKind::Concentration => self.concentrations.len(),
            AttributeKind::DispenserType => self.dispenser_types.len(),
            AttributeKind::Gender => self.genders.len(),
            AttributeKind::Size => self.sizes.len(),
            AttributeKind::Unit => {
                let mut units: Vec<SizeUnit> = self.sizes.iter().filter_map(|(_, u)| *u).collect();
                units.dedup();
                units.len()
            }
            AttributeKind::Brand => self.brands.len(),
            AttributeKind::Name => self.names.len(),
        }
    }
}

/// Push a value unless it is already present.
pub(crate) fn push_distinct<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

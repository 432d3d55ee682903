//! Product records built from catalog rows.

use serde::{Deserialize, Serialize};

use crate::extraction::ParsedAttributes;
use crate::schema::{AttributeKind, Concentration, DispenserType, Gender, SizeUnit};

/// A structured product built from one catalog row.
///
/// Every attribute is optional: `None` means "never set", which is distinct
/// from any value a field can hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Source row (1-based).
    pub row_number: usize,
    pub code: Option<String>,
    pub name: Option<String>,
    pub brand_id: Option<u32>,
    pub concentration: Option<Concentration>,
    pub dispenser_type: Option<DispenserType>,
    pub gender: Option<Gender>,
    /// Size magnitude as a decimal string.
    pub size: Option<String>,
    pub unit: Option<SizeUnit>,
    pub country_of_origin: Option<String>,
    pub li_free: Option<bool>,
    /// Raw row text the record was built from.
    pub original_source_text: String,
}

/// A problem found when validating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: &'static str,
    pub message: String,
}

impl ProductRecord {
    /// Create an empty record for a source row.
    pub fn new(row_number: usize, original_source_text: impl Into<String>) -> Self {
        Self {
            row_number,
            original_source_text: original_source_text.into(),
            ..Default::default()
        }
    }

    /// Returns true if the field behind an attribute holds a value.
    pub fn is_set(&self, kind: AttributeKind) -> bool {
        match kind {
            AttributeKind::Concentration => self.concentration.is_some(),
            AttributeKind::DispenserType => self.dispenser_type.is_some(),
            AttributeKind::Gender => self.gender.is_some(),
            AttributeKind::Size => self.size.is_some(),
            AttributeKind::Unit => self.unit.is_some(),
            AttributeKind::Brand => self.brand_id.is_some(),
            AttributeKind::Name => self.name.is_some(),
        }
    }

    /// Reset the field behind an attribute to "never set".
    pub fn clear(&mut self, kind: AttributeKind) {
        match kind {
            AttributeKind::Concentration => self.concentration = None,
            AttributeKind::DispenserType => self.dispenser_type = None,
            AttributeKind::Gender => self.gender = None,
            AttributeKind::Size => self.size = None,
            AttributeKind::Unit => self.unit = None,
            AttributeKind::Brand => self.brand_id = None,
            AttributeKind::Name => self.name = None,
        }
    }

    /// Copy present parsed fields into the record.
    ///
    /// Without `overwrite`, a field is filled only while it is still unset.
    /// Returns the attributes that were written.
    pub fn apply(&mut self, parsed: &ParsedAttributes, overwrite: bool) -> Vec<AttributeKind> {
        fn fill<T: Clone>(
            slot: &mut Option<T>,
            value: &Option<T>,
            overwrite: bool,
            kind: AttributeKind,
            written: &mut Vec<AttributeKind>,
        ) {
            if let Some(v) = value {
                if overwrite || slot.is_none() {
                    *slot = Some(v.clone());
                    written.push(kind);
                }
            }
        }

        let mut written = Vec::new();
        fill(&mut self.concentration, &parsed.concentration, overwrite, AttributeKind::Concentration, &mut written);
        fill(&mut self.dispenser_type, &parsed.dispenser_type, overwrite, AttributeKind::DispenserType, &mut written);
        fill(&mut self.gender, &parsed.gender, overwrite, AttributeKind::Gender, &mut written);
        fill(&mut self.size, &parsed.size_value, overwrite, AttributeKind::Size, &mut written);
        fill(&mut self.unit, &parsed.size_unit, overwrite, AttributeKind::Unit, &mut written);
        fill(&mut self.brand_id, &parsed.brand_id, overwrite, AttributeKind::Brand, &mut written);
        fill(&mut self.name, &parsed.extracted_name, overwrite, AttributeKind::Name, &mut written);
        written
    }

    /// Check structurally required fields.
    pub fn validate(&self) -> Vec<FieldProblem> {
        let mut problems = Vec::new();

        if self.code.as_deref().is_none_or(|c| c.trim().is_empty()) {
            problems.push(FieldProblem {
                field: "code",
                message: "product code is missing".to_string(),
            });
        }

        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            problems.push(FieldProblem {
                field: "name",
                message: "product name is missing".to_string(),
            });
        }

        match (&self.size, self.unit) {
            (Some(size), unit) => {
                match size.parse::<f64>() {
                    Ok(v) if v > 0.0 => {}
                    _ => problems.push(FieldProblem {
                        field: "size",
                        message: format!("size '{}' is not a positive number", size),
                    }),
                }
                if unit.is_none() {
                    problems.push(FieldProblem {
                        field: "unit",
                        message: format!("size {} has no unit", size),
                    });
                }
            }
            (None, Some(unit)) => problems.push(FieldProblem {
                field: "size",
                message: format!("unit {} given without a size", unit),
            }),
            (None, None) => {}
        }

        problems
    }

    /// Returns true if the record passes validation.
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

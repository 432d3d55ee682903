//! Direct column-to-field assignment with light cleanup.

use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{EssenceError, Result};
use crate::record::ProductRecord;
use crate::rules::RuleSet;
use crate::schema::{parse_flag, split_code, split_size, ColumnTarget};

/// Assign one non-null cell to its record field.
///
/// Returns any text that should go on to description analysis (the tail of
/// an overloaded code cell).
pub fn apply_cell(
    record: &mut ProductRecord,
    target: ColumnTarget,
    cell: &str,
    rules: &RuleSet,
) -> Result<Option<String>> {
    let value = cell.trim();
    let field = target.field_name();

    match target {
        ColumnTarget::Code => {
            let (code, overflow) = split_code(value);
            record.code = Some(code);
            return Ok(overflow);
        }
        ColumnTarget::Name => record.name = Some(value.to_string()),
        ColumnTarget::Brand => {
            let id = match value.parse::<u32>() {
                Ok(id) => id,
                Err(_) => rules
                    .brand_name_to_id
                    .get(&rules.normalize_key(value))
                    .copied()
                    .ok_or_else(|| EssenceError::mapping(field, format!("unknown brand '{}'", value)))?,
            };
            record.brand_id = Some(id);
        }
        ColumnTarget::Concentration => {
            record.concentration = Some(vocabulary(rules, &rules.concentrations, field, value)?)
        }
        ColumnTarget::DispenserType => {
            record.dispenser_type = Some(vocabulary(rules, &rules.dispenser_types, field, value)?)
        }
        ColumnTarget::Gender => record.gender = Some(vocabulary(rules, &rules.genders, field, value)?),
        ColumnTarget::Size => {
            let (size, unit) = split_size(value)
                .ok_or_else(|| EssenceError::mapping(field, format!("no numeric size in '{}'", value)))?;
            record.size = Some(size);
            if let Some(unit) = unit {
                record.unit.get_or_insert(unit);
            }
        }
        ColumnTarget::Unit => record.unit = Some(vocabulary(rules, &rules.units, field, value)?),
        ColumnTarget::CountryOfOrigin => record.country_of_origin = Some(value.to_string()),
        ColumnTarget::LiFree => {
            let flag = parse_flag(value)
                .ok_or_else(|| EssenceError::mapping(field, format!("'{}' is not a yes/no value", value)))?;
            record.li_free = Some(flag);
        }
    }

    Ok(None)
}

/// Look a cell up in the rule set's dictionary, then in the vocabulary's
/// own spellings.
fn vocabulary<V>(rules: &RuleSet, dictionary: &IndexMap<String, V>, field: &str, value: &str) -> Result<V>
where
    V: Copy + FromStr<Err = String>,
{
    if let Some(v) = dictionary.get(&rules.normalize_key(value)) {
        return Ok(*v);
    }
    value
        .parse::<V>()
        .map_err(|message| EssenceError::mapping(field, message))
}

//! Teaching statements: `pattern -> attribute = value`.
//!
//! ```text
//! statement := pattern arrow attribute "=" value
//! arrow     := "->" | "=>" | "→"
//! attribute := gender | concentration | type | dispenser | brand | product | size
//! ```
//!
//! Categorical attributes become dictionary entries keyed by the pattern
//! text. `size` statements become a new pattern rule: the pattern is a
//! regex whose first capture group is the magnitude, and the value is the
//! unit. `brand` and `product` values are brand ids.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::rules::{PatternRule, RuntimeRuleManager};
use crate::schema::{AttributeKind, SizeUnit};

static STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.+?)\s*(?:->|=>|→)\s*([A-Za-z_]+)\s*=\s*(.+?)\s*$")
        .expect("valid teaching statement regex")
});

/// Priority of learned size rules; they run ahead of the built-in rules.
pub const LEARNED_RULE_PRIORITY: i32 = 5;

/// Name prefix of learned size rules.
pub const LEARNED_SIZE_PREFIX: &str = "learned_size";

/// A parsed teaching statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeachingStatement {
    pub pattern: String,
    pub attribute: AttributeKind,
    pub value: String,
}

impl FromStr for TeachingStatement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let caps = STATEMENT
            .captures(s)
            .ok_or_else(|| "expected 'pattern -> attribute = value'".to_string())?;

        let attribute = match caps[2].to_ascii_lowercase().as_str() {
            "gender" => AttributeKind::Gender,
            "concentration" => AttributeKind::Concentration,
            "type" | "dispenser" => AttributeKind::DispenserType,
            "brand" => AttributeKind::Brand,
            "product" => AttributeKind::Name,
            "size" => AttributeKind::Size,
            other => return Err(format!("unknown attribute '{}'", other)),
        };

        Ok(Self {
            pattern: caps[1].to_string(),
            attribute,
            value: caps[3].to_string(),
        })
    }
}

/// What a successful statement changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lesson {
    DictionaryEntry {
        attribute: AttributeKind,
        token: String,
        value: String,
    },
    SizeRule {
        name: String,
        pattern: String,
        unit: SizeUnit,
    },
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lesson::DictionaryEntry {
                attribute,
                token,
                value,
            } => write!(f, "{} '{}' = {}", attribute, token, value),
            Lesson::SizeRule { name, pattern, unit } => {
                write!(f, "rule {} /{}/ in {}", name, pattern, unit)
            }
        }
    }
}

/// A statement that could not be learned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningFailure {
    pub statement: String,
    pub reason: String,
}

impl fmt::Display for LearningFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.statement, self.reason)
    }
}

/// Result of applying one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningOutcome {
    Learned(Lesson),
    Failed(LearningFailure),
}

/// Parse a statement and apply it through the manager.
///
/// Statement problems come back as [`LearningOutcome::Failed`]. Only fatal
/// errors (the rule set could not be persisted) are returned as `Err`.
pub fn learn(manager: &mut RuntimeRuleManager, statement: &str) -> Result<LearningOutcome> {
    let fail = |reason: String| {
        warn!(statement, reason = %reason, "teaching statement rejected");
        LearningOutcome::Failed(LearningFailure {
            statement: statement.to_string(),
            reason,
        })
    };

    let parsed = match statement.parse::<TeachingStatement>() {
        Ok(parsed) => parsed,
        Err(reason) => return Ok(fail(reason)),
    };

    let applied = match parsed.attribute {
        AttributeKind::Size => learn_size_rule(manager, &parsed),
        AttributeKind::Brand | AttributeKind::Name => match parsed.value.parse::<u32>() {
            Ok(id) => {
                let result = if parsed.attribute == AttributeKind::Brand {
                    manager.add_brand_mapping(&parsed.pattern, id)
                } else {
                    manager.add_product_name_mapping(&parsed.pattern, id)
                };
                result.map(|_| Ok(dictionary_lesson(&parsed)))
            }
            Err(_) => Ok(Err(format!("brand id '{}' is not a number", parsed.value))),
        },
        kind => manager
            .add_dictionary_entry(kind, &parsed.pattern, &parsed.value)
            .map(|_| Ok(dictionary_lesson(&parsed))),
    };

    match applied {
        Ok(Ok(lesson)) => {
            info!(lesson = %lesson, "learned");
            Ok(LearningOutcome::Learned(lesson))
        }
        Ok(Err(reason)) => Ok(fail(reason)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => Ok(fail(e.to_string())),
    }
}

fn dictionary_lesson(parsed: &TeachingStatement) -> Lesson {
    Lesson::DictionaryEntry {
        attribute: parsed.attribute,
        token: parsed.pattern.clone(),
        value: parsed.value.clone(),
    }
}

/// Inner `Err` is a statement problem, outer `Err` a store failure.
fn learn_size_rule(
    manager: &mut RuntimeRuleManager,
    parsed: &TeachingStatement,
) -> Result<std::result::Result<Lesson, String>> {
    let unit = match parsed.value.parse::<SizeUnit>() {
        Ok(unit) => unit,
        Err(reason) => return Ok(Err(reason)),
    };

    // Descriptions are uppercased before matching.
    let pattern = if manager.snapshot().case_sensitive {
        parsed.pattern.clone()
    } else {
        format!("(?i){}", parsed.pattern)
    };

    match Regex::new(&pattern) {
        Ok(re) if re.captures_len() > 1 => {}
        Ok(_) => {
            return Ok(Err(
                "a size pattern needs a capture group for the magnitude".to_string(),
            ));
        }
        Err(e) => return Ok(Err(format!("pattern does not compile: {}", e))),
    }

    let name = manager.next_rule_name(LEARNED_SIZE_PREFIX);
    let rule = PatternRule::new(name.clone(), pattern.clone(), AttributeKind::Size)
        .with_value(unit.label())
        .with_priority(LEARNED_RULE_PRIORITY)
        .stop_on_match();
    manager.add_rule(rule)?;

    Ok(Ok(Lesson::SizeRule {
        name,
        pattern,
        unit,
    }))
}

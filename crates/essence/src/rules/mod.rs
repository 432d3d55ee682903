//! Rule set configuration: dictionaries, pattern rules and their store.
//!
//! The rule set is a JSON document that lives beside the catalog files. The
//! [`ConfigStore`] is its single source of truth and persists every change
//! immediately; [`RuntimeRuleManager`] keeps a compiled extractor in sync
//! with it.
//!
//! # Usage
//!
//! ```no_run
//! use essence::rules::{PatternRule, RuntimeRuleManager};
//! use essence::AttributeKind;
//!
//! let mut manager = RuntimeRuleManager::open("essence.rules.json").unwrap();
//! manager.add_brand_mapping("Chanel", 1).unwrap();
//! manager
//!     .add_rule(PatternRule::new("cc", r"(\d+)\s*CC\b", AttributeKind::Size).with_value("ml"))
//!     .unwrap();
//!
//! let parsed = manager.extractor().parse_description("CHANEL NO 5 50 CC");
//! assert_eq!(parsed.brand_id, Some(1));
//! ```

mod manager;
mod rule_set;
mod store;

pub use manager::RuntimeRuleManager;
pub use rule_set::{PatternRule, RuleSet, FORMAT_VERSION};
pub use store::ConfigStore;

//! Rule-driven attribute extraction from free catalog text.
//!
//! # Pipeline
//!
//! ```text
//! text ─▶ normalize ─▶ pattern rules (priority order) ─▶ dictionary fallback
//!         uppercase,    first success per field wins     token/phrase scan for
//!         strip ignore                                    fields still unset
//!         patterns
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use essence::extraction::Extractor;
//! use essence::rules::RuleSet;
//!
//! let extractor = Extractor::new(Arc::new(RuleSet::default())).unwrap();
//! let parsed = extractor.parse_description("Blu Mediterraneo 30ml EDT spray");
//! assert_eq!(parsed.size_value.as_deref(), Some("30"));
//! ```

mod compiled;
mod extractor;
mod parsed;

pub use compiled::{CompiledRule, CompiledRules};
pub use extractor::Extractor;
pub use parsed::{CandidateSet, ParsedAttributes, Provenance};

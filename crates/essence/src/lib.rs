//! Essence: rule-driven attribute extraction for fragrance catalogs.
//!
//! Essence turns free catalog text such as
//! `"ADP BLU MEDITERRANEO MIRTO DI PANAREA 30ML EDT SPRAY 29.6ml"` into
//! structured product attributes (concentration, size and unit, dispenser
//! type, gender, brand id, cleaned name) and applies that extraction across
//! tabular catalog files.
//!
//! # Core Principles
//!
//! - **Deterministic**: dictionary lookups and ordered pattern rules, nothing
//!   statistical
//! - **Explicit provenance**: every extracted field records the rule or
//!   dictionary phrase it came from; an unset field is `None`, never a default
//! - **Teachable**: an operator can resolve low-confidence fields and add
//!   rules at runtime; every change is persisted before it takes effect
//!
//! # Example
//!
//! ```no_run
//! use essence::{ColumnTarget, FileSchema, RowConverter};
//!
//! let schema = FileSchema::new()
//!     .with_title_row(1)
//!     .map_column(0, ColumnTarget::Code)
//!     .describe_column(1);
//!
//! let mut converter = RowConverter::open("essence.rules.json").unwrap();
//! let result = converter.convert("catalog.csv", &schema).unwrap();
//!
//! println!("Records: {}", result.records.len());
//! println!("Issues: {}", result.errors.len());
//! ```

pub mod conversion;
pub mod error;
pub mod extraction;
pub mod input;
pub mod interactive;
pub mod record;
pub mod rules;
pub mod schema;

pub use conversion::{ConversionResult, ConversionSummary, DelimitedSink, RecordSink, RowConverter, RowIssue};
pub use error::{EssenceError, Result};
pub use extraction::{Extractor, ParsedAttributes, Provenance};
pub use input::{RowSource, SourceMetadata, TabularFile};
pub use interactive::{
    Answer, ChannelResolver, ConsoleResolver, FirstCandidateResolver, InteractiveContext, InteractiveResolver,
    ScriptedResolver,
};
pub use record::ProductRecord;
pub use rules::{ConfigStore, PatternRule, RuleSet, RuntimeRuleManager};
pub use schema::{AttributeKind, ColumnTarget, Concentration, DispenserType, FileSchema, Gender, SizeUnit};

//! Converting catalog files into product records.
//!
//! For each row in the schema's data range, [`RowConverter`]:
//!
//! 1. records blank rows as issues and skips recurring title rows,
//! 2. assigns mapped columns to record fields,
//! 3. runs description columns (and code-cell overflow) through the
//!    extractor, filling only fields that are still unset,
//! 4. validates the record.
//!
//! With a resolver, step 3 first estimates a confidence per attribute and
//! asks the resolver about anything below its threshold, and may learn new
//! rules from the row's text.

mod converter;
mod mapping;
mod result;
mod sink;

pub use converter::{estimate_confidence, RowConverter};
pub use mapping::apply_cell;
pub use result::{ConversionResult, ConversionSummary, Coverage, IssueKind, RowIssue};
pub use sink::{DelimitedSink, RecordSink, RECORD_COLUMNS};

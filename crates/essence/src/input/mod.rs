//! Input parsing and row sources.

mod parser;
mod source;

pub use parser::{detect_delimiter, Parser, ParserConfig};
pub use source::{is_blank_row, is_null_value, RowSource, SourceMetadata, TabularFile};

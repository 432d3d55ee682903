//! Attribute vocabularies and tabular file layout.

mod column;
mod table;
mod types;

pub use column::{format_magnitude, parse_flag, split_code, split_size, ColumnTarget};
pub use table::FileSchema;
pub use types::{AttributeKind, Concentration, DispenserType, Gender, SizeUnit};

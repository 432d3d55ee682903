//! CLI command implementations.

pub mod convert;
pub mod parse;
pub mod rules;

//! Fuzz target for row parsing and conversion.
//!
//! This fuzzer tests that:
//! 1. The delimited parser never panics on malformed input
//! 2. Conversion turns every bad row into an issue instead of failing

#![no_main]

use essence::input::{detect_delimiter, Parser};
use essence::rules::RuntimeRuleManager;
use essence::{ColumnTarget, FileSchema, RowConverter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let Ok(delimiter) = detect_delimiter(data) else {
        return;
    };
    let Ok(rows) = Parser::new().parse_bytes(data, delimiter) else {
        return;
    };

    let Ok(dir) = tempfile::TempDir::new() else {
        return;
    };
    let Ok(manager) = RuntimeRuleManager::open(dir.path().join("rules.json")) else {
        return;
    };
    let mut converter = RowConverter::new(manager);

    let schema = FileSchema::new()
        .with_recurring_titles()
        .map_column(0, ColumnTarget::Code)
        .map_column(2, ColumnTarget::Size)
        .map_column(3, ColumnTarget::Brand)
        .describe_column(1);

    let result = converter
        .convert_source(&rows, &schema, None)
        .expect("row problems are issues, not errors");
    assert_eq!(result.lines_processed, rows.len());
});

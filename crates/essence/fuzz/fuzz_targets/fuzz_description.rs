//! Fuzz target for description parsing.
//!
//! Checks that extraction never panics on arbitrary text and that every
//! extracted size is a number.

#![no_main]

use std::sync::Arc;

use essence::rules::RuleSet;
use essence::Extractor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let Ok(extractor) = Extractor::new(Arc::new(RuleSet::default())) else {
            return;
        };

        let parsed = extractor.parse_description(text);
        if let Some(size) = parsed.size_value {
            assert!(size.parse::<f64>().is_ok(), "size '{}' is not a number", size);
        }
        let _ = extractor.candidates(text);
    }
});

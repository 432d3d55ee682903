//! Fuzz target for teaching statements.
//!
//! Feeds arbitrary statements through the learner. A statement either
//! becomes a lesson or a reported failure; it never panics and never leaves
//! an uncompilable rule set behind.

#![no_main]

use essence::interactive::learn;
use essence::rules::RuntimeRuleManager;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1_000 {
        return;
    }

    let Ok(statement) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(dir) = tempfile::TempDir::new() else {
        return;
    };
    let Ok(mut manager) = RuntimeRuleManager::open(dir.path().join("rules.json")) else {
        return;
    };

    if learn(&mut manager, statement).is_ok() {
        assert!(manager.validate().is_empty());
        let _ = manager.extractor().parse_description(statement);
    }
});

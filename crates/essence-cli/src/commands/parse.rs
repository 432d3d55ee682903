//! Parse command - extract attributes from one description.

use std::path::Path;

use colored::Colorize;
use essence::conversion::estimate_confidence;
use essence::interactive::DEFAULT_CONFIDENCE_THRESHOLD;
use essence::{AttributeKind, Provenance, RuntimeRuleManager};

pub fn run(rules: &Path, text: String, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manager = RuntimeRuleManager::open(rules)?;
    let extractor = manager.extractor();

    let parsed = extractor.parse_description(&text);
    let candidates = extractor.candidates(&text);

    if json_output {
        let confidence: serde_json::Map<String, serde_json::Value> = AttributeKind::ALL
            .iter()
            .map(|kind| {
                let score = estimate_confidence(parsed.provenance(*kind), candidates.count(*kind));
                (kind.label().to_string(), serde_json::json!(score))
            })
            .collect();
        let output = serde_json::json!({
            "text": text,
            "normalized": extractor.normalize(&text),
            "attributes": parsed,
            "confidence": confidence,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Parsing".cyan().bold(), text.white());
    println!("  Normalized: {}", extractor.normalize(&text));
    println!();

    if parsed.is_empty() {
        println!("{}", "Nothing detected.".yellow());
        return Ok(());
    }

    for kind in AttributeKind::ALL {
        let confidence = estimate_confidence(parsed.provenance(kind), candidates.count(kind));
        match parsed.value_label(kind) {
            Some(value) => {
                let source = match parsed.provenance(kind) {
                    Some(Provenance::Rule(name)) => format!("rule {}", name),
                    Some(Provenance::Dictionary(phrase)) => format!("dictionary '{}'", phrase),
                    None => String::new(),
                };
                let score = format!("{:.2}", confidence);
                let score = if confidence >= DEFAULT_CONFIDENCE_THRESHOLD {
                    score.green()
                } else {
                    score.yellow()
                };
                println!(
                    "  {:<15} {:<24} {} ({})",
                    kind.label(),
                    value.white().bold(),
                    score,
                    source.dimmed()
                );
            }
            None => println!("  {:<15} {}", kind.label(), "-".dimmed()),
        }
    }

    if !parsed.matched_rule_names.is_empty() {
        println!();
        println!("  Rules matched: {}", parsed.matched_rule_names.join(", "));
    }

    Ok(())
}

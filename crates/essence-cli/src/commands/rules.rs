//! Rules command - inspect, edit and teach the persisted rule set.

use std::path::Path;

use colored::Colorize;
use essence::interactive::{learn, LearningOutcome};
use essence::{AttributeKind, PatternRule, RuntimeRuleManager};

use crate::cli::RulesCommand;

pub fn run(rules: &Path, action: RulesCommand) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = RuntimeRuleManager::open(rules)?;

    match action {
        RulesCommand::Validate => {
            let problems = manager.validate();
            if problems.is_empty() {
                println!("{} {} is valid", "OK".green().bold(), rules.display());
                return Ok(());
            }
            for problem in &problems {
                println!("  {} {}", "✗".red(), problem);
            }
            return Err(format!("{} problems in {}", problems.len(), rules.display()).into());
        }

        RulesCommand::Show { json } => {
            let snapshot = manager.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
                return Ok(());
            }

            println!(
                "{} {} (revision {}, format {})",
                "Rule set".cyan().bold(),
                rules.display(),
                snapshot.revision,
                snapshot.format_version
            );

            println!();
            println!("{}", "Rules".cyan().bold());
            let mut ordered: Vec<_> = snapshot.rules.iter().collect();
            ordered.sort_by_key(|r| r.priority);
            for rule in ordered {
                let value = rule
                    .value
                    .as_deref()
                    .map(|v| format!(" = {}", v))
                    .unwrap_or_default();
                println!(
                    "  {:>4}  {:<20} {:<15} /{}/{}",
                    rule.priority,
                    rule.name.white().bold(),
                    rule.attribute.label(),
                    rule.pattern,
                    value
                );
            }

            for kind in AttributeKind::ALL {
                let entries = snapshot.entries(kind);
                if entries.is_empty() {
                    continue;
                }
                println!();
                println!("{} ({})", kind.label().cyan().bold(), entries.len());
                for (token, value) in entries {
                    println!("  {:<28} {}", token, value);
                }
            }

            if !snapshot.ignore_patterns.is_empty() {
                println!();
                println!("{}", "Ignored".cyan().bold());
                for pattern in &snapshot.ignore_patterns {
                    println!("  /{}/", pattern);
                }
            }
        }

        RulesCommand::Export { path } => {
            manager.export_to(&path)?;
            println!("{} rule set to {}", "Exported".green().bold(), path.display());
        }

        RulesCommand::Import { path } => {
            manager.import_from(&path)?;
            println!(
                "{} {} (previous rule set kept in history)",
                "Imported".green().bold(),
                path.display()
            );
        }

        RulesCommand::AddRule {
            name,
            pattern,
            attribute,
            priority,
            groups,
            stop_on_match,
            value,
        } => {
            let mut rule = PatternRule::new(&name, pattern, attribute)
                .with_priority(priority)
                .with_groups(groups);
            if stop_on_match {
                rule = rule.stop_on_match();
            }
            if let Some(value) = value {
                rule = rule.with_value(value);
            }
            manager.add_rule(rule)?;
            println!("{} rule {}", "Added".green().bold(), name.white().bold());
        }

        RulesCommand::RemoveRule { name } => {
            if manager.remove_rule(&name)? {
                println!("{} rule {}", "Removed".green().bold(), name);
            } else {
                println!("{} no rule named {}", "Warning:".yellow().bold(), name);
            }
        }

        RulesCommand::AddEntry {
            attribute,
            token,
            value,
        } => {
            manager.add_dictionary_entry(attribute, &token, &value)?;
            println!(
                "{} {} '{}' = {}",
                "Added".green().bold(),
                attribute.label(),
                token,
                value
            );
        }

        RulesCommand::RemoveEntry { attribute, token } => {
            if manager.remove_dictionary_entry(attribute, &token)? {
                println!("{} {} '{}'", "Removed".green().bold(), attribute.label(), token);
            } else {
                println!(
                    "{} no {} entry '{}'",
                    "Warning:".yellow().bold(),
                    attribute.label(),
                    token
                );
            }
        }

        RulesCommand::Teach { statements } => {
            let mut failed = 0;
            for statement in &statements {
                match learn(&mut manager, statement)? {
                    LearningOutcome::Learned(lesson) => {
                        println!("{} {}", "Learned".green().bold(), lesson);
                    }
                    LearningOutcome::Failed(failure) => {
                        failed += 1;
                        println!("{} {}", "Rejected".red().bold(), failure);
                    }
                }
            }
            if failed > 0 {
                return Err(format!("{} of {} statements were not learned", failed, statements.len()).into());
            }
        }
    }

    Ok(())
}

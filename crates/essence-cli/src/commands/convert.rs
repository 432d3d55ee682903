//! Convert command - turn a catalog file into product records.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;
use essence::{ConsoleResolver, ConversionResult, DelimitedSink, FileSchema, RecordSink, RowConverter};
use tracing::debug;

use crate::cli::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub fn run(
    rules: &Path,
    file: PathBuf,
    schema_path: PathBuf,
    interactive: bool,
    threshold: f64,
    output: Option<PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = FileSchema::load(&schema_path)?;
    let mut converter = RowConverter::open(rules)?;
    debug!(
        rules = %rules.display(),
        rule_count = converter.manager().extractor().rule_count(),
        "rule set loaded"
    );

    println!("{} {}", "Converting".cyan().bold(), file.display());

    let result = if interactive {
        let mut resolver = ConsoleResolver::stdio().with_threshold(threshold);
        converter.convert_interactive(&file, &schema, &mut resolver)?
    } else {
        converter.convert(&file, &schema)?
    };

    let output_path = output.unwrap_or_else(|| {
        let mut p = file.clone();
        let stem = p.file_stem().unwrap_or_default().to_string_lossy().to_string();
        p.set_file_name(format!("{}_records.{}", stem, format.extension()));
        p
    });
    write_records(&result, &output_path, &format)?;

    print_summary(&result, verbose);
    println!();
    println!(
        "{} {} records to {}",
        "Wrote".green().bold(),
        result.records.len(),
        output_path.display()
    );

    Ok(())
}

fn write_records(
    result: &ConversionResult,
    path: &Path,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = if matches!(format, OutputFormat::Tsv) { b'\t' } else { b',' };
            let mut sink = DelimitedSink::create(path, delimiter)?;
            sink.accept_all(&result.records)?;
            sink.into_inner()?;
        }
        OutputFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(
                &mut writer,
                &serde_json::json!({
                    "records": result.records,
                    "errors": result.errors,
                    "summary": result.summary(),
                }),
            )?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn print_summary(result: &ConversionResult, verbose: bool) {
    let summary = result.summary();

    println!();
    println!("{}", "Summary".cyan().bold());
    println!("  Lines processed: {}", summary.lines_processed);
    println!("  Records:         {}", summary.records.to_string().white().bold());
    if result.empty_lines > 0 {
        println!("  Empty lines:     {}", result.empty_lines);
    }
    if result.skipped_title_rows > 0 {
        println!("  Title rows:      {}", result.skipped_title_rows);
    }
    if result.interactive_decision_count > 0 || result.learned_rule_count > 0 {
        println!("  Decisions:       {}", result.interactive_decision_count);
        println!("  Rules learned:   {}", result.learned_rule_count);
    }

    println!();
    println!("{}", "Coverage".cyan().bold());
    for (attribute, coverage) in &summary.coverage {
        println!(
            "  {:<15} {:>6} ({:.0}%)",
            attribute,
            coverage.count,
            coverage.ratio * 100.0
        );
    }

    if !result.errors.is_empty() {
        println!();
        println!(
            "{} {} issues on {} rows",
            "Warning:".yellow().bold(),
            result.errors.len(),
            summary.rows_with_issues
        );
        for (kind, count) in &summary.issues_by_kind {
            println!("  {}: {}", kind, count);
        }

        let shown = if verbose { result.errors.len() } else { 10 };
        for issue in result.errors.iter().take(shown) {
            let field = issue.field.as_deref().map(|f| format!(" [{}]", f)).unwrap_or_default();
            println!(
                "  {} {}{}: {}",
                "row".dimmed(),
                issue.row,
                field,
                issue.message.red()
            );
        }
        if result.errors.len() > shown {
            println!("  ... and {} more (use -v to list all)", result.errors.len() - shown);
        }
    }

    for failure in &result.learning_failures {
        println!("{} could not learn {}", "Warning:".yellow().bold(), failure);
    }
}

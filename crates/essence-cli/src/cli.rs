//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use essence::AttributeKind;
use std::path::PathBuf;

/// Essence: rule-driven attribute extraction for fragrance catalogs
#[derive(Parser)]
#[command(name = "essence")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Rule set file (created with the built-in rules if missing)
    #[arg(long, global = true, default_value = "essence.rules.json")]
    pub rules: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract attributes from a single description
    Parse {
        /// Catalog text, e.g. "ADP BLU 30ML EDT SPRAY"
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a catalog file into product records
    Convert {
        /// Path to the catalog file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// File schema (JSON) describing rows and columns
        #[arg(short, long)]
        schema: PathBuf,

        /// Ask on low-confidence fields and offer to learn rules
        #[arg(short, long)]
        interactive: bool,

        /// Confidence below which a field is asked about
        #[arg(long, default_value = "0.7")]
        threshold: f64,

        /// Output path for records (default: <file>_records.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Inspect and edit the rule set
    Rules {
        #[command(subcommand)]
        action: RulesCommand,
    },
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// Check the rule set for problems
    Validate,

    /// Show the rule set
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the rule set to another file
    Export {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Replace the rule set with another file (the current one is backed up)
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Add a pattern rule
    AddRule {
        /// Unique rule name
        name: String,

        /// Regular expression, matched against uppercased text
        pattern: String,

        /// Attribute the rule extracts
        #[arg(short, long)]
        attribute: AttributeKind,

        /// Evaluation order; lower runs first
        #[arg(short, long, default_value = "100")]
        priority: i32,

        /// Capture groups to read
        #[arg(short, long, value_delimiter = ',', default_value = "1")]
        groups: Vec<usize>,

        /// Stop after the first successful match
        #[arg(long)]
        stop_on_match: bool,

        /// Fixed value instead of a dictionary lookup (the unit for size rules)
        #[arg(long)]
        value: Option<String>,
    },

    /// Remove a pattern rule by name
    RemoveRule { name: String },

    /// Add or replace a dictionary entry
    AddEntry {
        /// Dictionary (concentration, dispenser, gender, unit, brand, product)
        attribute: AttributeKind,
        token: String,
        value: String,
    },

    /// Remove a dictionary entry
    RemoveEntry {
        attribute: AttributeKind,
        token: String,
    },

    /// Apply teaching statements ("pattern -> attribute = value")
    Teach {
        #[arg(value_name = "STATEMENT", required = true)]
        statements: Vec<String>,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

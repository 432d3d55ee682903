//! Essence CLI - catalog attribute extraction.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let result = match cli.command {
        Commands::Parse { text, json } => commands::parse::run(&cli.rules, text, json),

        Commands::Convert {
            file,
            schema,
            interactive,
            threshold,
            output,
            format,
        } => commands::convert::run(
            &cli.rules,
            file,
            schema,
            interactive,
            threshold,
            output,
            format,
            cli.verbose,
        ),

        Commands::Rules { action } => commands::rules::run(&cli.rules, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    apply, extract, reconcile, validate, ApplyArgs, ExtractArgs, ReconcileArgs, ValidateArgs,
};
use tracing_subscriber::EnvFilter;

/// Docedit CLI - structure-level editing of Word documents
#[derive(Parser, Debug)]
#[command(name = "docedit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print or write the structure tree of a .docx file
    Extract(ExtractArgs),

    /// Parse, normalize and validate an action payload
    Validate(ValidateArgs),

    /// Apply an action payload and write the edited document
    Apply(ApplyArgs),

    /// Regenerate a document from a (hand-edited) structure tree
    Reconcile(ReconcileArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Extract(args) => extract(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
        Command::Reconcile(args) => reconcile(args, &cwd),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

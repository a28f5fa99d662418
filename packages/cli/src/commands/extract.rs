use super::{resolve, write_structure};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use docedit_editor::extract_file;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Input .docx file
    pub input: PathBuf,

    /// Write the structure here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn extract(args: ExtractArgs, cwd: &str) -> Result<()> {
    let input = resolve(cwd, &args.input);
    let structure = extract_file(&input)
        .with_context(|| format!("Cannot extract {}", input.display()))?;

    match args.output {
        Some(output) => {
            let output = resolve(cwd, &output);
            write_structure(&structure, &output)?;
            println!(
                "  {} {} → {} ({} paragraphs, {} tables)",
                "✓".green(),
                args.input.display(),
                output.display(),
                structure.meta.paragraph_count,
                structure.meta.table_count
            );
        }
        None => println!("{}", structure.to_json_pretty()?),
    }

    Ok(())
}

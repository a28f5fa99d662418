use super::{read_structure, resolve, write_structure};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use docedit_docx::write_atomic;
use docedit_editor::{
    extract_bytes, EditOutcome, EditPipeline, MemoryRevisionStore, RevisionStore,
};
use std::path::PathBuf;

const DOC_ID: &str = "cli";

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Original .docx file
    pub input: PathBuf,

    /// Structure tree to edit (extracted from the original when omitted)
    #[arg(short, long)]
    pub structure: Option<PathBuf>,

    /// File containing the raw action payload
    #[arg(short, long)]
    pub actions: PathBuf,

    /// Output .docx file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write the edited structure tree here
    #[arg(long)]
    pub structure_out: Option<PathBuf>,

    /// Instruction recorded with the revision
    #[arg(short, long, default_value = "CLI edit")]
    pub instruction: String,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;

    let input = resolve(cwd, &args.input);
    let original =
        std::fs::read(&input).with_context(|| format!("Cannot read {}", input.display()))?;

    let structure = match &args.structure {
        Some(path) => read_structure(&resolve(cwd, path))?,
        None => extract_bytes(&original)?,
    };

    let actions = resolve(cwd, &args.actions);
    let payload = std::fs::read_to_string(&actions)
        .with_context(|| format!("Cannot read {}", actions.display()))?;

    let mut store = MemoryRevisionStore::new();
    store.insert(DOC_ID, original, structure);

    let mut pipeline = EditPipeline::new(store, config.renderer(cwd))
        .with_options(config.reconcile_options());

    match pipeline.edit(DOC_ID, &args.instruction, &payload)? {
        EditOutcome::Clarification { question } => {
            println!("{} {}", "?".bright_blue().bold(), question);
            println!("Nothing was written");
        }
        EditOutcome::Applied {
            rev_id,
            changes,
            structure,
        } => {
            let output = resolve(cwd, &args.output);
            let bytes = pipeline.store().revision(DOC_ID, &rev_id)?;
            write_atomic(&output, &bytes)
                .with_context(|| format!("Cannot write {}", output.display()))?;

            for change in &changes {
                println!("  {} {}", "•".bright_black(), change);
            }
            println!("  {} {}", "✓".green(), output.display());

            if let Some(path) = &args.structure_out {
                let path = resolve(cwd, path);
                write_structure(&structure, &path)?;
                println!("  {} {}", "✓".green(), path.display());
            }
        }
    }

    Ok(())
}

use super::{read_structure, resolve};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use docedit_docx::Document;
use docedit_editor::Reconciler;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Original .docx file
    pub input: PathBuf,

    /// Structure tree describing the desired content
    #[arg(short, long)]
    pub structure: PathBuf,

    /// Output .docx file
    #[arg(short, long)]
    pub output: PathBuf,
}

pub fn reconcile(args: ReconcileArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let renderer = config.renderer(cwd);

    let input = resolve(cwd, &args.input);
    let structure = read_structure(&resolve(cwd, &args.structure))?;

    let mut document =
        Document::open(&input).with_context(|| format!("Cannot open {}", input.display()))?;
    let report = Reconciler::new(&renderer)
        .with_options(config.reconcile_options())
        .reconcile_document(&mut document, &structure);

    let output = resolve(cwd, &args.output);
    document
        .save(&output)
        .with_context(|| format!("Cannot write {}", output.display()))?;

    println!(
        "  {} {} → {}",
        "✓".green(),
        args.input.display(),
        output.display()
    );
    println!(
        "    {} reused, {} rewritten, {} created, {} removed",
        report.reused, report.rewritten, report.created, report.removed
    );
    if report.diagram_failures > 0 {
        println!(
            "    {} {} diagram(s) could not be rendered",
            "⚠️".yellow(),
            report.diagram_failures
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docedit_docx::fixture::DocxBuilder;
    use docedit_editor::extract_bytes;

    #[test]
    fn test_reconcile_hand_edited_structure() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        let docx = DocxBuilder::new()
            .paragraph("Keep", None)
            .paragraph("Drop", None)
            .build();

        let mut structure = extract_bytes(&docx).unwrap();
        structure.sections[0].paragraphs.remove(1);
        structure.sections[0].paragraphs[0].text = "Kept".to_string();

        std::fs::write(dir.path().join("in.docx"), &docx).unwrap();
        std::fs::write(
            dir.path().join("s.json"),
            structure.to_json_pretty().unwrap(),
        )
        .unwrap();

        reconcile(
            ReconcileArgs {
                input: "in.docx".into(),
                structure: "s.json".into(),
                output: "out.docx".into(),
            },
            &cwd,
        )
        .unwrap();

        let document = Document::open(dir.path().join("out.docx")).unwrap();
        let texts: Vec<String> = document
            .paragraphs()
            .into_iter()
            .map(|p| document.paragraph_text(p))
            .collect();
        assert_eq!(texts, vec!["Kept"]);
    }

    #[test]
    fn test_reconcile_rejects_bad_structure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("in.docx"), DocxBuilder::new().build()).unwrap();
        std::fs::write(dir.path().join("s.json"), "not json").unwrap();

        let result = reconcile(
            ReconcileArgs {
                input: "in.docx".into(),
                structure: "s.json".into(),
                output: "out.docx".into(),
            },
            &dir.path().display().to_string(),
        );
        assert!(result.is_err());
    }
}

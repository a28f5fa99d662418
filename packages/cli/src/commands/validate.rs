use super::resolve;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use docedit_actions::{parse_actions, EditAction, TRUNCATED_RESPONSE_HINT};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// File containing the raw action payload
    pub input: PathBuf,
}

pub fn validate(args: ValidateArgs, cwd: &str) -> Result<()> {
    let input = resolve(cwd, &args.input);
    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("Cannot read {}", input.display()))?;

    let batch = parse_actions(&raw)?;

    if let [EditAction::Noop { reason: Some(reason) }] = batch.actions() {
        if reason == TRUNCATED_RESPONSE_HINT {
            eprintln!("{} Payload is not valid JSON", "⚠️".yellow());
        }
    }

    if let Some(question) = batch.clarification() {
        eprintln!("{} Clarification requested: {}", "?".bright_blue(), question);
    }

    println!("{}", serde_json::to_string_pretty(&batch)?);
    eprintln!(
        "{} {} valid action{}",
        "✓".green(),
        batch.len(),
        if batch.len() == 1 { "" } else { "s" }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(payload: &str) -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("actions.json"), payload).unwrap();
        validate(
            ValidateArgs {
                input: "actions.json".into(),
            },
            &dir.path().display().to_string(),
        )
    }

    #[test]
    fn test_validate_accepts_normalized_fields() {
        assert!(run(r#"[{"op": "clarify", "prompt": "Which section?"}]"#).is_ok());
    }

    #[test]
    fn test_validate_rejects_schema_violation() {
        let err = run(r#"[{"action": "delete_paragraph", "section_id": "s1"}]"#).unwrap_err();
        assert!(err.to_string().contains("paragraph_id"));
    }

    #[test]
    fn test_validate_tolerates_truncated_payload() {
        assert!(run(r#"[{"action": "noop""#).is_ok());
    }
}

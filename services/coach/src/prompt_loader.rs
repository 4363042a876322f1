use anyhow::{Context, Result};
use coach_core::Persona;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Reads every `*.md` file in `dir_path` into a map keyed by file stem.
/// Trailing whitespace is dropped and blank files are skipped.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let entries = fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?;

    let mut prompts = HashMap::new();
    for path in entries.map(|entry| entry.map(|e| e.path())) {
        let path = path?;
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        if !path.is_file() || !is_markdown {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            tracing::warn!("Skipping prompt file with a non UTF-8 name: {}", path.display());
            continue;
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
        let text = text.trim_end();
        if text.is_empty() {
            tracing::warn!("Ignoring empty prompt file {}", path.display());
            continue;
        }

        tracing::debug!("Loaded prompt '{}' ({} chars)", name, text.len());
        prompts.insert(name.to_string(), text.to_string());
    }

    Ok(prompts)
}

/// The policy prompt this deployment runs with: the persona's override from
/// `dir_path` when one exists, otherwise the built-in text.
pub fn resolve_policy_prompt(persona: Persona, dir_path: Option<&Path>) -> Result<String> {
    let Some(dir_path) = dir_path else {
        return Ok(persona.policy_prompt().to_string());
    };

    let mut prompts = load_prompts(dir_path)?;
    match prompts.remove(persona.key()) {
        Some(prompt) => {
            tracing::info!(
                "Using policy prompt override for '{}' from {}",
                persona,
                dir_path.display()
            );
            Ok(prompt)
        }
        None => Ok(persona.policy_prompt().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_prompts_successfully() -> Result<()> {
        // 1. Arrange: two persona files, a non-markdown file and a subdirectory.
        let dir = tempdir()?;
        let dir_path = dir.path();

        let mut recruiter = File::create(dir_path.join("recruiter.md"))?;
        writeln!(recruiter, "You are Bluey. Safety first.")?;

        let mut coach = File::create(dir_path.join("esl-coach.md"))?;
        writeln!(coach, "You are a kind coach.")?;

        let mut ignored_file = File::create(dir_path.join("notes.txt"))?;
        writeln!(ignored_file, "not a prompt")?;

        std::fs::create_dir(dir_path.join("subdir"))?;

        // 2. Act
        let prompts = load_prompts(dir_path)?;

        // 3. Assert: only the markdown files, with trailing newlines dropped.
        assert_eq!(prompts.len(), 2, "Should only load .md files");
        assert_eq!(
            prompts.get("recruiter").unwrap(),
            "You are Bluey. Safety first."
        );
        assert_eq!(prompts.get("esl-coach").unwrap(), "You are a kind coach.");
        assert!(prompts.get("notes").is_none());

        Ok(())
    }

    #[test]
    fn test_empty_prompt_files_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("recruiter.md"))?;
        let mut blank = File::create(dir.path().join("esl-coach.md"))?;
        writeln!(blank, "   ")?;

        let prompts = load_prompts(dir.path())?;

        assert!(prompts.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_prompts_from_nonexistent_dir() {
        let dir_path = Path::new("nonexistent_dir_for_testing_prompts");

        let result = load_prompts(dir_path);

        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_uses_override_for_the_configured_persona() -> Result<()> {
        let dir = tempdir()?;
        let mut coach = File::create(dir.path().join("esl-coach.md"))?;
        writeln!(coach, "Custom coach prompt")?;

        let coach_prompt = resolve_policy_prompt(Persona::EslCoach, Some(dir.path()))?;
        let recruiter_prompt = resolve_policy_prompt(Persona::Recruiter, Some(dir.path()))?;

        assert_eq!(coach_prompt, "Custom coach prompt");
        assert_eq!(recruiter_prompt, Persona::Recruiter.policy_prompt());
        Ok(())
    }

    #[test]
    fn test_resolve_without_dir_uses_builtin() -> Result<()> {
        let prompt = resolve_policy_prompt(Persona::Recruiter, None)?;
        assert_eq!(prompt, Persona::Recruiter.policy_prompt());
        Ok(())
    }
}

use anyhow::{Context, anyhow};
use std::path::Path;

/// Reads the task instruction from a text file. Surrounding whitespace is dropped.
pub fn load_instruction(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read instruction: {}", path.display()))?;
    non_empty_instruction(&raw)
        .ok_or_else(|| anyhow!("instruction file is empty: {}", path.display()))
}

pub fn non_empty_instruction(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

//! Output formatting for different formats.

use anyhow::Result;
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Available output formats.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// Render a structured document. Node configs are YAML files on the
/// node, so `Pretty` renders YAML for them.
pub fn render_document<T: Serialize>(format: OutputFormat, value: &T) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml | OutputFormat::Pretty => serde_yaml::to_string(value)?,
    })
}

/// Parse an input file: JSON for `.json`, YAML otherwise.
pub fn parse_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {e}", path.display()));
    }
    serde_yaml::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Invalid YAML in {}: {e}", path.display()))
}

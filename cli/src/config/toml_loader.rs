//! TOML configuration file parsing.
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and deserialize a TOML file.
///
/// # Type Parameters
///
/// - `T`: Target type to deserialize into (must implement `DeserializeOwned`)
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content, &path.display().to_string())
}

/// Deserialize TOML text, naming `origin` in any parse error.
///
/// # Errors
///
/// Returns an error if `content` is not valid TOML for `T`.
pub fn parse_config<T: DeserializeOwned>(content: &str, origin: &str) -> Result<T> {
    toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {origin}"))
}

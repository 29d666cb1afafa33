use std::path::Path;

use sceneforge_core::HistoryConfig;
use serde::Deserialize;

/// Top-level project configuration loaded from `project.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    /// Change log tunables; every key is optional.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// General project information.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
}

/// Load a project config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read,
/// parsed, or carries an unusable `[history]` table.
pub fn load_project(path: &Path) -> Result<ProjectConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_project(&content).map_err(|e| format!("{}: {e}", path.display()))
}

fn parse_project(content: &str) -> Result<ProjectConfig, String> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| format!("failed to parse: {e}"))?;
    config
        .history
        .validate()
        .map_err(|e| format!("invalid [history]: {e}"))?;
    Ok(config)
}

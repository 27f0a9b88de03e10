use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::convert::{ConvertOptions, SchemaVersion};

/// Persisted conversion settings used by CLI workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertSettings {
    /// Schema to force; `None` detects it from the document.
    pub schema: Option<SchemaVersion>,
    pub strict_morph_target_names: bool,
    pub generate_renamed_variants: bool,
    pub verbose: bool,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            schema: None,
            strict_morph_target_names: false,
            generate_renamed_variants: false,
            verbose: false,
        }
    }
}

impl ConvertSettings {
    /// Resolve the call-scoped options for `json`.
    pub fn to_options(&self, json: &Value) -> ConvertOptions {
        ConvertOptions {
            schema: self.schema.unwrap_or_else(|| SchemaVersion::detect(json)),
            strict_morph_target_names: self.strict_morph_target_names,
            generate_renamed_variants: self.generate_renamed_variants,
        }
    }
}

/// Save conversion settings to a JSON file.
pub fn save_settings(path: &Path, settings: &ConvertSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)
        .context("failed to serialize conversion settings as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save conversion settings: {}", path.display()))?;
    Ok(())
}

/// Load conversion settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<ConvertSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load conversion settings: {}", path.display()))?;
    let settings: ConvertSettings =
        serde_json::from_str(&content).context("failed to parse conversion settings JSON")?;
    Ok(settings)
}

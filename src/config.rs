//! Bridge configuration
//!
//! Parses engine defaults for new settings handles, plus where the `fov_lua`
//! runner looks for scripts, from a YAML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::consts::{CornerPeek, OpaqueApply, Shape};

/// Engine defaults and script location
///
/// Every field is optional; missing fields fall back to what
/// `fov_settings_init` would pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FovConfig {
    /// Shape of the lit area
    #[serde(default)]
    pub shape: Shape,

    /// Peek around convex corners
    #[serde(default)]
    pub corner_peek: CornerPeek,

    /// Light opaque cells too
    #[serde(default)]
    pub opaque_apply: OpaqueApply,

    /// Directory scripts are resolved against by `fov_lua`
    #[serde(default = "default_script_dir")]
    pub script_dir: String,
}

fn default_script_dir() -> String {
    "./scripts/".to_string()
}

impl Default for FovConfig {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            corner_peek: CornerPeek::default(),
            opaque_apply: OpaqueApply::default(),
            script_dir: default_script_dir(),
        }
    }
}

impl FovConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: FovConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML in {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_str(contents: &str) -> Result<Self> {
        let config: FovConfig = serde_yaml::from_str(contents).context("Failed to parse YAML")?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.script_dir.is_empty(), "script_dir cannot be empty");
        Ok(())
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(&self).context("Failed to serialize config to YAML")?;

        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config to {}", path.as_ref().display()))?;

        Ok(())
    }
}

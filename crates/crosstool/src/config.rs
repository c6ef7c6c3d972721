//! Targets file loading and validation.
//!
//! A targets file replaces the built-in target list and release labels:
//!
//! ```toml
//! [release]
//! major-version = "local"
//! minor-version = ""
//!
//! [[target]]
//! cpu = "arm"
//! libc = "linux-gnueabihf"
//! cross = true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builder::{default_targets, ReleaseLabels, TargetDescriptor};
use crate::error::{CrosstoolError, Result};

/// What to generate: release labels plus the ordered target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub release: ReleaseLabels,
    #[serde(rename = "target")]
    pub targets: Vec<TargetDescriptor>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            release: ReleaseLabels::default(),
            targets: default_targets(),
        }
    }
}

/// Load and validate a targets file.
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    if !path.exists() {
        return Err(CrosstoolError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::debug!(
        path = %path.display(),
        targets = config.targets.len(),
        "loaded targets file"
    );
    Ok(config)
}

/// Parse and validate a targets file from a TOML string.
pub fn parse_config(toml_str: &str) -> Result<GeneratorConfig> {
    let config: GeneratorConfig = toml::from_str(toml_str)?;
    validate_config(&config)?;
    Ok(config)
}

/// Check that every target is usable and names a distinct toolchain.
pub fn validate_config(config: &GeneratorConfig) -> Result<()> {
    if config.targets.is_empty() {
        return Err(CrosstoolError::Validation {
            detail: "no targets defined".into(),
        });
    }

    let mut seen = HashSet::new();
    for (i, target) in config.targets.iter().enumerate() {
        if target.cpu.trim().is_empty() {
            return Err(CrosstoolError::Validation {
                detail: format!("target #{} has an empty cpu", i + 1),
            });
        }
        if target.libc.trim().is_empty() {
            return Err(CrosstoolError::Validation {
                detail: format!("target #{} ({}) has an empty libc", i + 1, target.cpu),
            });
        }
        let identifier = target.system_name();
        if !seen.insert(identifier.clone()) {
            return Err(CrosstoolError::DuplicateToolchain { identifier });
        }
    }
    Ok(())
}

//! Error types for crosstool generation.

use std::path::PathBuf;

use crate::text_format::ParseError;

/// Errors that can occur while building or writing a CROSSTOOL release.
#[derive(Debug, thiserror::Error)]
pub enum CrosstoolError {
    /// Text-format parse error (baseline template or round-trip input).
    #[error("text format parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O error while writing the generated output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output file could not be created.
    #[error("failed to open {} for writing", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The boilerplate file could not be opened.
    #[error("failed to open {} for reading", path.display())]
    OpenBoilerplate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copying the boilerplate into the output failed partway.
    #[error("failed copying boilerplate {}", path.display())]
    CopyBoilerplate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// TOML deserialization error in a targets file.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Targets file not found.
    #[error("targets file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Invalid target configuration.
    #[error("validation error: {detail}")]
    Validation {
        /// Description of the validation failure.
        detail: String,
    },

    /// Two targets derive the same toolchain identifier.
    #[error("duplicate toolchain identifier '{identifier}'")]
    DuplicateToolchain { identifier: String },
}

/// Result type for crosstool operations.
pub type Result<T> = std::result::Result<T, CrosstoolError>;

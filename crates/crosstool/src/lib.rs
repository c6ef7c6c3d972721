//! CROSSTOOL generation for host and cross-compilation GCC toolchains.
//!
//! A release is produced in three steps:
//! - **Targets:** the built-in list or a TOML targets file ([`config`])
//! - **Toolchains:** one per target, derived from a shared baseline ([`builder`])
//! - **Output:** boilerplate, header and text-format body ([`release`])

pub mod builder;
pub mod config;
pub mod error;
pub mod release;
pub mod schema;
pub mod text_format;

pub use builder::{build_release, build_toolchain, default_targets, ReleaseLabels, TargetDescriptor};
pub use config::{load_config, GeneratorConfig};
pub use error::{CrosstoolError, Result};
pub use release::{write_release, write_release_file};
pub use schema::{CToolchain, CrosstoolRelease};

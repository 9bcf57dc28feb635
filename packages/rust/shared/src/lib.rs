//! Shared types, error model, and configuration for thesisbuild.
//!
//! This crate is the foundation depended on by all other thesisbuild crates.
//! It provides:
//! - [`ThesisBuildError`]: the unified error type
//! - Domain types ([`OutputFormat`], [`UnresolvedPolicy`], [`BuildReport`], [`BuildId`])
//! - Configuration ([`ToolConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ChaptersConfig, OutputConfig, RendererConfig, SettingsConfig, ToolConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_against,
};
pub use error::{Result, ThesisBuildError};
pub use types::{BuildId, BuildReport, CURRENT_SCHEMA_VERSION, OutputFormat, UnresolvedPolicy};

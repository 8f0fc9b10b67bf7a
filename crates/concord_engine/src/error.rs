//! # Engine Error Types

use std::path::PathBuf;

use concord_core::{PendingReport, RegistryError};
use thiserror::Error;

/// Errors raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config text is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by the module manager and the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A module of this type was already created.
    #[error("module `{0}` already created")]
    DuplicateModule(&'static str),

    /// A subscription was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Startup found modules waiting on dependencies that never arrived.
    #[error("{} module(s) wait on unresolved dependencies: {}", .0.len(), summarize(.0))]
    UnresolvedDependencies(Vec<PendingReport>),

    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn summarize(reports: &[PendingReport]) -> String {
    reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

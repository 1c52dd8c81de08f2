// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for configuration loading, validation, and registry construction.

use std::path::PathBuf;
use thiserror::Error;

/// A single problem found while validating an [`EngineConfig`](crate::config::EngineConfig).
///
/// Validation accumulates these so a caller sees every problem at once.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The cache must hold at least one entry
    #[error("cache_capacity must be greater than zero")]
    ZeroCacheCapacity,

    /// A worker pool was configured with no workers
    #[error("{pool} pool size must be greater than zero")]
    ZeroPoolSize {
        /// Which pool ("io" or "cpu")
        pool: &'static str,
    },

    /// Batches of size zero never make progress
    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,

    /// Two processor entries claim the same source type
    #[error("Duplicate processor registration for source type '{source_type}'")]
    DuplicateSourceType { source_type: String },

    /// A processor entry names an implementation the local backend does not provide
    #[error("Source type '{source_type}' references unknown processor '{processor}'")]
    UnknownProcessor {
        source_type: String,
        processor: String,
    },
}

/// Errors that can occur while loading configuration or building a runtime from it.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse failure
    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parse failure
    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension is neither YAML nor TOML
    #[error("Unsupported config format for '{0}': expected .yaml, .yml or .toml")]
    UnsupportedFormat(PathBuf),

    /// One or more validation rules failed
    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// A configured processor could not be instantiated
    #[error("Failed to create processor '{processor}' for source type '{source_type}': {reason}")]
    ProcessorCreationFailed {
        source_type: String,
        processor: String,
        reason: String,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_problem() {
        let err = ConfigError::Validation(vec![
            ValidationError::ZeroCacheCapacity,
            ValidationError::ZeroPoolSize { pool: "io" },
        ]);

        let message = err.to_string();
        assert!(message.contains("cache_capacity must be greater than zero"));
        assert!(message.contains("io pool size must be greater than zero"));
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading and validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration file parsed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub processor_count: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded engine configuration from '{}' with {} processors",
            self.path, self.processor_count
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            processor_count = self.processor_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("config_loaded", span_name = name, path = self.path)
    }
}

/// Configuration failed validation.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use unified_engine::errors::ValidationError;
/// use unified_engine::observability::messages::validation::ConfigValidationFailed;
///
/// let errors = vec![ValidationError::ZeroBatchSize];
/// let msg = ConfigValidationFailed { errors: &errors };
///
/// assert!(msg.to_string().contains("1 error"));
/// ```
pub struct ConfigValidationFailed<'a> {
    pub errors: &'a [ValidationError],
}

impl Display for ConfigValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Configuration validation failed with {} error(s)", self.errors.len())?;
        for error in self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl StructuredLog for ConfigValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(error_count = self.errors.len(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "config_validation",
            span_name = name,
            error_count = self.errors.len(),
        )
    }
}

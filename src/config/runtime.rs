// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{build_registry, validate_config, EngineConfig};
use crate::engine::UnifiedEngine;
use crate::errors::ConfigError;

/// Engine runtime builder - validates configuration and wires the processor
/// registry into a ready [`UnifiedEngine`].
///
/// # Examples
///
/// ```
/// use unified_engine::config::{EngineConfig, ProcessorConfig, RuntimeBuilder};
/// use std::collections::HashMap;
///
/// let config = EngineConfig {
///     processors: vec![ProcessorConfig {
///         source_type: "payments".to_string(),
///         processor: "echo".to_string(),
///         compatible_sources: vec!["card".to_string()],
///         options: HashMap::new(),
///     }],
///     ..EngineConfig::default()
/// };
///
/// let engine = RuntimeBuilder::from_config(&config).unwrap();
/// assert!(engine.registry().contains("payments"));
/// assert!(engine.is_idle());
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build an engine from configuration.
    ///
    /// # Errors
    /// * [`ConfigError::Validation`] if any validation rule fails
    /// * [`ConfigError::ProcessorCreationFailed`] if a processor cannot be built
    pub fn from_config(cfg: &EngineConfig) -> Result<UnifiedEngine, ConfigError> {
        validate_config(cfg).map_err(ConfigError::Validation)?;
        let registry = build_registry(cfg)?;
        Ok(UnifiedEngine::with_registry(cfg.clone(), registry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected() {
        let cfg = EngineConfig {
            io_pool_size: 0,
            ..EngineConfig::default()
        };

        let err = RuntimeBuilder::from_config(&cfg).err().unwrap();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }
}

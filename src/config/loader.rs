// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_BATCH_SIZE, DEFAULT_CACHE_CAPACITY, DEFAULT_IO_POOL_SIZE, FALLBACK_CPU_POOL_SIZE,
};
use crate::errors::ConfigError;
use crate::observability::messages::validation::{ConfigLoaded, ConfigValidationFailed};
use crate::observability::messages::StructuredLog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Engine configuration.
///
/// Every field is optional in the file; anything missing takes its default.
///
/// # Fields
/// * `cache_capacity` - Maximum number of cached node outputs (default 1000)
/// * `io_pool_size` - Concurrent units in the I/O pool (default 16)
/// * `cpu_pool_size` - Concurrent units in the CPU pool (default: host parallelism)
/// * `batch_size` - Nodes dispatched per batch by the demo runner (default 100)
/// * `batch_deadline_ms` - Per-batch deadline applied by `process_batch` (default none)
/// * `reject_cycles` - Reject submissions that would close a dependency cycle (default true)
/// * `failure_propagation` - What happens to dependents of a failed node (default isolate)
/// * `processors` - Processors to register at startup
///
/// # Example
/// ```yaml
/// cache_capacity: 500
/// io_pool_size: 32
/// batch_deadline_ms: 2000
/// failure_propagation: cascade
/// processors:
///   - source_type: social
///     processor: select_fields
///     compatible_sources: [twitter, instagram]
///     options:
///       fields: [author, text]
///   - source_type: payments
///     processor: echo
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache_capacity: usize,
    pub io_pool_size: usize,
    pub cpu_pool_size: usize,
    pub batch_size: usize,
    pub batch_deadline_ms: Option<u64>,
    pub reject_cycles: bool,
    pub failure_propagation: FailurePropagation,
    pub processors: Vec<ProcessorConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            io_pool_size: DEFAULT_IO_POOL_SIZE,
            cpu_pool_size: default_cpu_pool_size(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_deadline_ms: None,
            reject_cycles: true,
            failure_propagation: FailurePropagation::default(),
            processors: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// The configured per-batch deadline, if any.
    pub fn batch_deadline(&self) -> Option<Duration> {
        self.batch_deadline_ms.map(Duration::from_millis)
    }
}

fn default_cpu_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_CPU_POOL_SIZE)
}

/// What happens to the dependents of a node that fails or is cancelled.
///
/// # Variants
/// * `Isolate` - Dependents keep waiting and never run unless the dependency is
///   resubmitted and completes
/// * `Cascade` - Every transitive dependent is failed with `DependencyFailed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePropagation {
    #[default]
    Isolate,
    Cascade,
}

/// One processor registered at startup.
///
/// # Fields
/// * `source_type` - Source type the processor handles
/// * `processor` - Local implementation name (see `LocalProcessorFactory`)
/// * `compatible_sources` - Other source categories it can consume
/// * `options` - Implementation-specific options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub source_type: String,
    pub processor: String,
    #[serde(default)]
    pub compatible_sources: Vec<String>,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let cfg: EngineConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    ConfigLoaded {
        path: &path.display().to_string(),
        processor_count: cfg.processors.len(),
    }
    .log();

    Ok(cfg)
}

/// Load a config and run [`validate_config`](crate::config::validate_config) on it.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;

    if let Err(errors) = crate::config::validate_config(&cfg) {
        ConfigValidationFailed { errors: &errors }.log();
        return Err(ConfigError::Validation(errors));
    }

    Ok(cfg)
}
